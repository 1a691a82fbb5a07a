mod common;

use chipset_power::{
    BootKind, BootLevels, ChipsetConfig, ChipsetStateMask, Error, HookEvent, HostSleepEvent, PowerSignal,
    PowerState, ResetError, ResetKind, RetryError, SequencerState, SignalLatch, SignalWaitError, Signals,
    WirelessState,
};
use chipset_power::signal::SignalError;
use chipset_power::config::RSMRST_SETTLE_MS;
use common::{Call, Rig, rig};
use embassy_futures::block_on;

const RAILS_AND_SUS: Signals = Signals::PGOOD_ALL_CORE.union(Signals::PCH_SLP_SUS_DEASSERTED);
// Releasing RSMRST on the way up always costs one settle delay.
const SETTLE_MS: u64 = RSMRST_SETTLE_MS as u64;

fn config() -> ChipsetConfig {
    ChipsetConfig::new()
}

fn power_on(rig: &mut Rig<'_>, st: SequencerState) -> SequencerState {
    let mut st = st;
    assert!(st.request_power_on());
    block_on(rig.seq.advance(st))
}

/// Walk a cold-booted machine up to S0 with every signal present.
fn boot_to_s0<'a>(latch: &'a SignalLatch, config: ChipsetConfig) -> (Rig<'a>, SequencerState) {
    latch.store(Signals::ALL_S0);
    let mut rig = rig(latch, config);
    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    let st = block_on(rig.seq.advance(st));
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0);
    (rig, st)
}

#[test]
fn g3_holds_without_power_on_request() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let mut st = rig.seq.init(BootKind::Cold);
    for _ in 0..5 {
        st = block_on(rig.seq.advance(st));
        assert_eq!(st.state(), PowerState::G3);
    }

    assert!(rig.seq.notifier().events.is_empty());
    assert!(rig.seq.platform().calls.is_empty());
    assert!(rig.seq.chipset_mut().pmic_slp_sus.is_empty());
}

#[test]
fn power_on_reaches_s5_in_one_advance() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::S5);
    assert!(st.power_s5_up());
    assert_eq!(rig.seq.notifier().events, [HookEvent::PreInit]);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS);
}

#[test]
fn power_on_reaches_s0_in_one_advance_per_edge() {
    let latch = SignalLatch::new();
    let (rig, st) = boot_to_s0(&latch, config());

    assert_eq!(st.state(), PowerState::S0);
    assert!(!st.forcing_shutdown());
    assert_eq!(
        rig.seq.notifier().events,
        [HookEvent::PreInit, HookEvent::Startup, HookEvent::Resume]
    );
    assert_eq!(
        rig.seq.platform().calls,
        [
            Call::Backlight(true),
            Call::Wireless(WirelessState::On),
            Call::DeepSleep(false),
            Call::Prochot(false),
        ]
    );
}

#[test]
fn rail_loss_in_s0_forces_shutdown_and_drops_to_s3() {
    let latch = SignalLatch::new();
    let (mut rig, st) = boot_to_s0(&latch, config());

    latch.set(PowerSignal::RsmrstPgood, false);
    let st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S3);
    assert!(st.forcing_shutdown());
    assert_eq!(rig.seq.platform().count(Call::ButtonPress), 1);
    assert_eq!(rig.seq.notifier().count(HookEvent::Suspend), 1);
}

#[test]
fn rail_loss_steps_through_s0s3() {
    let latch = SignalLatch::new();
    let (mut rig, st) = boot_to_s0(&latch, config());

    latch.set(PowerSignal::RsmrstPgood, false);
    let st = block_on(rig.seq.step(st));

    assert_eq!(st.state(), PowerState::S0S3);
    assert!(st.forcing_shutdown());
}

#[test]
fn rail_loss_in_powered_states_always_goes_down() {
    for s0ix in [false, true] {
        for bits in 0..(1u32 << 5) {
            // Every combination of the other signals, rails absent.
            let others = Signals::from_bits_retain(bits << 1);

            let latch = SignalLatch::new();
            let (mut rig, mut st) = boot_to_s0(&latch, config().with_s0ix(true));
            if s0ix {
                st.set_host_sleep_event(HostSleepEvent::S0ixSuspend);
                st = block_on(rig.seq.advance(st));
                assert_eq!(st.state(), PowerState::S0ix);
            }
            let from = st.state();

            latch.store(others);
            let st = block_on(rig.seq.advance(st));

            assert!(
                st.state().rank() < from.rank() && st.state().rank() <= PowerState::S3.rank(),
                "{} with {:?} went to {}",
                from.name(),
                others,
                st.state().name()
            );
            assert!(st.forcing_shutdown());
        }
    }
}

#[test]
fn host_s3_exit_enables_wireless_once() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0.difference(Signals::SLP_S3_DEASSERTED));
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S3);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S3);

    latch.set(PowerSignal::SlpS3, true);
    let st = block_on(rig.seq.advance(st));
    let st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S0);
    assert_eq!(rig.seq.platform().count(Call::Wireless(WirelessState::On)), 1);
    assert_eq!(rig.seq.notifier().count(HookEvent::Resume), 1);
}

#[test]
fn charger_timeout_returns_to_g3_without_startup() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());
    rig.seq.platform_mut().charger_ready_on_poll = None;

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::G3);
    assert!(!st.forcing_shutdown());
    assert!(!st.power_s5_up());
    assert_eq!(rig.seq.notifier().events, [HookEvent::PreInit]);
    assert_eq!(rig.seq.platform().charger_polls, 11);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS + 1_000);
    assert_eq!(
        rig.seq.platform().calls,
        [Call::ButtonPress, Call::ButtonRelease]
    );
}

#[test]
fn charger_ready_late_still_powers_up() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());
    rig.seq.platform_mut().charger_ready_on_poll = Some(4);

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::S5);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS + 300);
}

#[test]
fn charger_refusal_aborts_immediately() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());
    rig.seq.platform_mut().refuses_power_on = true;

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS);
    assert_eq!(rig.seq.notifier().count(HookEvent::Startup), 0);
}

// How a rail loss during the charger wait should be handled is not pinned
// down by the hardware contract. It is treated like a charger refusal.
#[test]
fn rail_loss_during_charger_wait_is_treated_as_refusal() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());
    rig.seq.platform_mut().charger_ready_on_poll = None;
    rig.seq.platform_mut().drop_rails_on_poll = Some(3);

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::G3);
    assert!(!st.forcing_shutdown());
    // Rails dropped during poll 3 and were seen missing at poll 4.
    assert_eq!(rig.seq.platform().charger_polls, 3);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS + 300);
    assert_eq!(rig.seq.notifier().count(HookEvent::Startup), 0);
}

#[test]
fn missing_slp_sus_returns_to_g3() {
    let latch = SignalLatch::new();
    latch.store(Signals::PGOOD_ALL_CORE);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);

    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.clock.now_ms(), SETTLE_MS + u64::from(config().signal_timeout_ms));
    assert_eq!(rig.seq.platform().count(Call::ButtonRelease), 1);
}

#[test]
fn forced_shutdown_latch_clears_in_s5() {
    let latch = SignalLatch::new();
    let (mut rig, st) = boot_to_s0(&latch, config().with_s5_inactivity_timeout_ms(None));

    // The PCH reacts to the held button by asserting every sleep line.
    latch.store(Signals::PCH_SLP_SUS_DEASSERTED);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S3);
    assert!(st.forcing_shutdown());

    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S5);
    assert!(st.forcing_shutdown());
    assert_eq!(rig.seq.platform().count(Call::ButtonRelease), 0);

    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S5);
    assert!(!st.forcing_shutdown());
    assert_eq!(rig.seq.platform().count(Call::ButtonRelease), 1);
    assert_eq!(rig.seq.notifier().count(HookEvent::Shutdown), 1);
    assert_eq!(
        rig.seq.platform().count(Call::Wireless(WirelessState::Off)),
        1
    );
}

#[test]
fn hard_off_request_continues_to_g3() {
    let latch = SignalLatch::new();
    let (mut rig, mut st) = boot_to_s0(&latch, config().with_s5_inactivity_timeout_ms(None));

    rig.seq.request_hard_off(&mut st);
    assert!(st.forcing_shutdown());
    assert_eq!(st.state(), PowerState::S0);

    latch.store(RAILS_AND_SUS);
    let mut states = Vec::new();
    for _ in 0..3 {
        st = block_on(rig.seq.advance(st));
        states.push(st.state());
    }

    assert_eq!(states, [PowerState::S3, PowerState::S5, PowerState::G3]);
    assert!(!st.forcing_shutdown());
    assert_eq!(rig.seq.chipset_mut().force_g3, 1);
}

#[test]
fn s5_inactivity_drops_to_g3() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    assert_eq!(st.state(), PowerState::S5);

    rig.clock.advance_ms(9_999);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S5);

    rig.clock.advance_ms(1);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.seq.chipset_mut().force_g3, 1);
}

#[test]
fn power_on_request_in_s5_restarts_inactivity_timer() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let mut st = power_on(&mut rig, st);

    rig.clock.advance_ms(9_000);
    assert!(st.request_power_on());
    st = block_on(rig.seq.advance(st));
    rig.clock.advance_ms(9_000);
    st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S5);
}

#[test]
fn s5s3_rail_loss_diverts_to_g3() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    let st = block_on(rig.seq.step(st));
    assert_eq!(st.state(), PowerState::S5S3);

    latch.set(PowerSignal::RsmrstPgood, false);
    let st = block_on(rig.seq.step(st));
    assert_eq!(st.state(), PowerState::S5G3);
    let st = block_on(rig.seq.step(st));
    assert_eq!(st.state(), PowerState::G3);

    assert!(!st.forcing_shutdown());
    assert_eq!(rig.seq.notifier().count(HookEvent::Startup), 0);
}

#[test]
fn s3s0_rail_loss_diverts_to_s3s5() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    let st = block_on(rig.seq.advance(st));
    let st = block_on(rig.seq.step(st));
    assert_eq!(st.state(), PowerState::S3S0);

    latch.set(PowerSignal::RsmrstPgood, false);
    let st = block_on(rig.seq.step(st));

    assert_eq!(st.state(), PowerState::S3S5);
    assert!(st.forcing_shutdown());
    assert_eq!(rig.seq.platform().count(Call::Wireless(WirelessState::On)), 0);
}

#[test]
fn s0ix_round_trip() {
    let latch = SignalLatch::new();
    let (mut rig, mut st) = boot_to_s0(&latch, config().with_s0ix(true));
    rig.seq.platform_mut().calls.clear();

    // Suspend intent alone is not enough while SLP_S0 is deasserted.
    latch.set(PowerSignal::SlpS0, true);
    st.set_host_sleep_event(HostSleepEvent::S0ixSuspend);
    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0);

    latch.set(PowerSignal::SlpS0, false);
    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0ix);
    assert!(st.state().in_chipset_state(ChipsetStateMask::STANDBY));

    latch.set(PowerSignal::SlpS0, true);
    st.set_host_sleep_event(HostSleepEvent::S0ixResume);
    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0);

    assert_eq!(
        rig.seq.platform().calls,
        [
            Call::LidWakeMask(true),
            Call::DeepSleep(true),
            Call::LidWakeMask(false),
            Call::DeepSleep(false),
        ]
    );
    assert_eq!(
        &rig.seq.notifier().events[3..],
        [HookEvent::Suspend, HookEvent::Resume]
    );
}

fn boot_to_s0ix<'a>(latch: &'a SignalLatch) -> (Rig<'a>, SequencerState) {
    let (mut rig, mut st) = boot_to_s0(latch, config().with_s0ix(true));
    latch.set(PowerSignal::SlpS0, false);
    st.set_host_sleep_event(HostSleepEvent::S0ixSuspend);
    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0ix);
    rig.seq.platform_mut().calls.clear();
    (rig, st)
}

#[test]
fn s0ix_exits_on_host_resume_with_slp_s0_asserted() {
    let latch = SignalLatch::new();
    let (mut rig, mut st) = boot_to_s0ix(&latch);
    let events = rig.seq.notifier().events.len();

    st.set_host_sleep_event(HostSleepEvent::S0ixResume);
    st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S0);
    assert_eq!(&rig.seq.notifier().events[events..], [HookEvent::Resume]);
    assert_eq!(
        rig.seq.platform().calls,
        [Call::LidWakeMask(false), Call::DeepSleep(false)]
    );

    // Resume intent with SLP_S0 still asserted does not re-enter S0ix.
    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::S0);
}

#[test]
fn slp_s0_blip_without_host_resume_stays_in_s0ix() {
    let latch = SignalLatch::new();
    let (mut rig, mut st) = boot_to_s0ix(&latch);
    let events = rig.seq.notifier().events.len();

    for level in [true, false, true, false] {
        latch.set(PowerSignal::SlpS0, level);
        st = block_on(rig.seq.advance(st));
        assert_eq!(st.state(), PowerState::S0ix);
    }

    assert_eq!(rig.seq.notifier().events.len(), events);
    assert!(rig.seq.platform().calls.is_empty());
}

#[test]
fn s0ix_ignored_when_unsupported() {
    let latch = SignalLatch::new();
    let (mut rig, mut st) = boot_to_s0(&latch, config());

    st.set_host_sleep_event(HostSleepEvent::S0ixSuspend);
    st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S0);
}

#[test]
fn warm_restart_in_s0_does_not_redrive() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::WarmRestart);

    assert_eq!(st.state(), PowerState::S0);
    assert!(!st.forcing_shutdown());
    assert_eq!(rig.seq.platform().calls, [Call::DeepSleep(false)]);
    assert!(rig.seq.notifier().events.is_empty());
    assert_eq!(rig.seq.chipset_mut().force_g3, 0);
}

#[test]
fn warm_restart_outside_s0_forces_g3() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::WarmRestart);

    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.seq.chipset_mut().force_g3, 1);
    assert_eq!(rig.seq.chipset_mut().pmic_slp_sus, [false]);
}

#[test]
fn cold_boot_starts_in_g3_without_forcing() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);

    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.seq.chipset_mut().force_g3, 0);
}

#[test]
fn suspend_line_not_mirrored_in_g3() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    let st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::G3);
    assert!(rig.seq.chipset_mut().pmic_slp_sus.is_empty());
    assert!(rig.seq.chipset_mut().rsmrst_edges.is_empty());

    let _ = power_on(&mut rig, st);
    assert_eq!(rig.seq.chipset_mut().pmic_slp_sus.last(), Some(&true));
    assert_eq!(rig.seq.chipset_mut().rsmrst_edges, [true]);
}

#[test]
fn rtc_reset_retries_then_stays_off() {
    let latch = SignalLatch::new();
    latch.store(RAILS_AND_SUS);
    let mut rig = rig(&latch, config().with_rtc_reset(true));

    let st = rig.seq.init(BootKind::Cold);
    let mut st = power_on(&mut rig, st);
    assert!(st.power_s5_up());

    for attempt in 1..=4 {
        st = block_on(rig.seq.advance(st));
        assert_eq!(st.state(), PowerState::S5);
        assert_eq!(rig.seq.chipset_mut().rtc_resets, attempt);
    }

    st = block_on(rig.seq.advance(st));
    assert_eq!(st.state(), PowerState::G3);
    assert_eq!(rig.seq.chipset_mut().rtc_resets, 5);
}

#[test]
fn rtc_reset_wait_ends_when_s4_deasserts() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config().with_rtc_reset(true));

    let st = rig.seq.init(BootKind::Cold);
    let st = power_on(&mut rig, st);
    let st = block_on(rig.seq.advance(st));

    assert_eq!(st.state(), PowerState::S3);
    assert_eq!(rig.seq.chipset_mut().rtc_resets, 0);
}

#[test]
fn throttle_only_when_on() {
    let latch = SignalLatch::new();
    latch.store(Signals::ALL_S0);
    let mut rig = rig(&latch, config());

    let st = rig.seq.init(BootKind::Cold);
    assert!(!rig.seq.throttle_cpu(&st, true));

    let (mut rig, st) = boot_to_s0(&latch, config());
    assert!(rig.seq.throttle_cpu(&st, true));
    assert_eq!(rig.seq.platform().calls.last(), Some(&Call::Prochot(true)));
}

#[test]
fn reset_entry_points() {
    let latch = SignalLatch::new();
    let (mut rig, st) = boot_to_s0(&latch, config());

    assert_eq!(block_on(rig.seq.chipset_reset(&st, ResetKind::Cold)), Ok(()));
    assert_eq!(rig.seq.chipset_mut().sys_reset, [true, false]);
    assert_eq!(block_on(rig.seq.chipset_reset(&st, ResetKind::Warm)), Ok(()));
    assert_eq!(rig.seq.chipset_mut().rcin, [true, false]);

    let off = SequencerState::new();
    assert_eq!(
        block_on(rig.seq.chipset_reset(&off, ResetKind::Cold)),
        Err(ResetError::ChipsetOff)
    );
}

#[test]
fn wait_signals_reports_missing() {
    let latch = SignalLatch::new();
    latch.store(Signals::PCH_SLP_SUS_DEASSERTED);
    let mut rig = rig(&latch, config());
    let _ = rig.seq.init(BootKind::Cold);

    let result = block_on(rig.seq.wait_signals(PowerState::S5, Signals::ALL_S0, 50));

    assert_eq!(
        result,
        Err(SignalWaitError::Timeout {
            missing: Signals::PGOOD_ALL_CORE | Signals::SLP_S3_DEASSERTED | Signals::SLP_S4_DEASSERTED
        })
    );
    assert_eq!(rig.clock.now_ms(), 50);
}

#[test]
fn every_step_takes_an_allowed_edge() {
    let latch = SignalLatch::new();
    let mut rig = rig(&latch, config().with_s0ix(true).with_rtc_reset(true));
    let mut st = rig.seq.init(BootKind::Cold);

    // Deterministic pseudo-random signal churn.
    let mut seed: u32 = 0x1234_5678;
    for i in 0..300 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        latch.store(Signals::from_bits_truncate(seed >> 26));
        if i % 7 == 0 {
            st.request_power_on();
        }
        if i % 11 == 0 {
            st.set_host_sleep_event(HostSleepEvent::S0ixSuspend);
        }

        let from = st.state();
        st = block_on(rig.seq.step(st));
        assert!(
            from.may_step_to(st.state()),
            "{} -> {}",
            from.name(),
            st.state().name()
        );
        if st.state() == PowerState::G3 {
            assert!(!st.forcing_shutdown());
        }
    }
}

#[test]
fn boot_levels_keep_a_running_chipset_powered() {
    assert_eq!(
        BootLevels::new(BootKind::WarmRestart, Signals::ALL_S0),
        BootLevels {
            rsmrst_l: true,
            pmic_slp_sus_l: true,
            host_on: true,
        }
    );
    assert_eq!(
        BootLevels::new(BootKind::WarmRestart, RAILS_AND_SUS),
        BootLevels {
            rsmrst_l: true,
            pmic_slp_sus_l: true,
            host_on: false,
        }
    );
    assert_eq!(
        BootLevels::new(BootKind::WarmRestart, Signals::empty()),
        BootLevels::new(BootKind::Cold, Signals::empty())
    );
}

#[test]
fn boot_levels_on_cold_boot_ignore_signals() {
    let levels = BootLevels::new(BootKind::Cold, Signals::ALL_S0);

    assert!(!levels.rsmrst_l);
    assert!(!levels.pmic_slp_sus_l);
    assert!(!levels.host_on);
}

#[test]
fn sequencer_errors_convert_with_question_mark() {
    async fn reset_then_wait(rig: &mut Rig<'_>, st: &SequencerState) -> Result<(), Error> {
        rig.seq.chipset_reset(st, ResetKind::Cold).await?;
        rig.seq.wait_signals(PowerState::S5, Signals::ALL_S0, 20).await?;
        Ok(())
    }

    let latch = SignalLatch::new();
    let (mut rig, st) = boot_to_s0(&latch, config());
    latch.store(RAILS_AND_SUS);

    assert_eq!(
        block_on(reset_then_wait(&mut rig, &SequencerState::new())),
        Err(Error::Reset(ResetError::ChipsetOff))
    );
    assert_eq!(
        block_on(reset_then_wait(&mut rig, &st)),
        Err(Error::Wait(SignalWaitError::Timeout {
            missing: Signals::SLP_S3_DEASSERTED | Signals::SLP_S4_DEASSERTED
        }))
    );
    assert_eq!(Error::from(SignalError::Bus), Error::Signal(SignalError::Bus));
    assert_eq!(
        Error::from(RetryError::Exhausted { tries: 3 }),
        Error::Retry(RetryError::Exhausted { tries: 3 })
    );
}
