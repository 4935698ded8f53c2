// ── Per-device state controller ──
//
// Owns the locally cached state of one device. Mutations are staged
// into the cache first, then sent through the gateway. Gateway calls
// for one controller run one at a time in invocation order; a failed
// call puts the fields it staged back to the last state the device
// accepted, unless a later operation has since overwritten them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use vreeda_api::AckPayload;

use crate::error::CoreError;
use crate::gateway::DeviceGateway;
use crate::model::{Channel, Device, DeviceState, PendingUpdate, Preset};

/// A mutation the user can request on a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceOp {
    /// Flip the power state. An unknown state counts as off.
    Toggle,
    /// Set one color channel; the full triple is sent.
    SetChannel { channel: Channel, value: f64 },
    /// Apply a named preset.
    Preset(Preset),
}

/// What an operation wrote locally, kept for rollback.
struct Staged {
    after: DeviceState,
    update: PendingUpdate,
}

/// State machine for one device.
///
/// Observers receive every change through [`subscribe`](Self::subscribe),
/// including the optimistic stage and any rollback.
pub struct DeviceStateController<G> {
    device_id: String,
    gateway: G,
    state: watch::Sender<DeviceState>,
    connected: AtomicBool,
    /// Last state the device API accepted: the snapshot plus every
    /// successful update.
    confirmed: StdMutex<DeviceState>,
    /// Held across a gateway call. tokio's mutex is FIFO, which keeps
    /// calls in invocation order.
    in_flight: Mutex<()>,
}

impl<G: DeviceGateway> DeviceStateController<G> {
    /// Initialize from a device snapshot.
    pub fn new(device: &Device, gateway: G) -> Self {
        let (state, _) = watch::channel(device.states.clone());
        Self {
            device_id: device.id.clone(),
            gateway,
            state,
            connected: AtomicBool::new(device.connected),
            confirmed: StdMutex::new(device.states.clone()),
            in_flight: Mutex::new(()),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The locally cached state, including unconfirmed changes.
    pub fn current_state(&self) -> DeviceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn mark_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Replace the cache with a fresh snapshot from the device API.
    pub fn replace_snapshot(&self, device: &Device) {
        self.mark_connected(device.connected);
        *self.confirmed() = device.states.clone();
        self.state.send_replace(device.states.clone());
    }

    // ── Operations ───────────────────────────────────────────────────

    pub async fn toggle_on(&self) -> Result<AckPayload, CoreError> {
        self.apply(DeviceOp::Toggle).await
    }

    pub async fn set_channel(&self, channel: Channel, value: f64) -> Result<AckPayload, CoreError> {
        self.apply(DeviceOp::SetChannel { channel, value }).await
    }

    pub async fn apply_preset(&self, preset: Preset) -> Result<AckPayload, CoreError> {
        self.apply(DeviceOp::Preset(preset)).await
    }

    /// Stage `op` locally, then send it.
    ///
    /// Fails without calling the gateway when the device is offline or
    /// the operation is invalid; the cache is untouched in both cases.
    pub async fn apply(&self, op: DeviceOp) -> Result<AckPayload, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::DeviceDisconnected {
                device_id: self.device_id.clone(),
            });
        }
        validate(op)?;

        let staged = self.stage(op)?;
        // No await between staging and queueing, so queue order is stage order.
        let _turn = self.in_flight.lock().await;

        debug!(device_id = %self.device_id, ?op, "applying device state");
        match self
            .gateway
            .apply_device_state(&self.device_id, &staged.update)
            .await
        {
            Ok(ack) => {
                write_sent(&mut self.confirmed(), &staged.update);
                info!(device_id = %self.device_id, ?op, "device state committed");
                Ok(ack)
            }
            Err(e) => {
                self.roll_back(&staged);
                warn!(device_id = %self.device_id, error = %e, "state change failed, reverted");
                Err(e.into())
            }
        }
    }

    fn stage(&self, op: DeviceOp) -> Result<Staged, CoreError> {
        let mut staged = None;
        self.state
            .send_modify(|state| staged = Some(stage_into(state, op)));
        staged.ok_or_else(|| CoreError::Internal("state was not staged".into()))
    }

    fn confirmed(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.confirmed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put the fields `staged` sent back to their confirmed values.
    fn roll_back(&self, staged: &Staged) {
        let confirmed = self.confirmed().clone();
        let after = &staged.after;
        self.state.send_if_modified(|state| match staged.update {
            PendingUpdate::Power { .. } => {
                revert(&mut state.on, confirmed.on.as_ref(), after.on.as_ref())
            }
            PendingUpdate::Color(_) => {
                let mut changed =
                    revert(&mut state.hue, confirmed.hue.as_ref(), after.hue.as_ref());
                changed |= revert(
                    &mut state.saturation,
                    confirmed.saturation.as_ref(),
                    after.saturation.as_ref(),
                );
                changed |= revert(
                    &mut state.brightness,
                    confirmed.brightness.as_ref(),
                    after.brightness.as_ref(),
                );
                changed |= revert(
                    &mut state.program,
                    confirmed.program.as_ref(),
                    after.program.as_ref(),
                );
                changed
            }
        });
    }
}

fn stage_into(state: &mut DeviceState, op: DeviceOp) -> Staged {
    let update = match op {
        DeviceOp::Toggle => {
            let on = !state.on.unwrap_or(false);
            state.on = Some(on);
            PendingUpdate::Power { on }
        }
        DeviceOp::SetChannel { channel, value } => {
            state.set_channel(channel, value);
            let color = state.color();
            state.set_color(color);
            PendingUpdate::Color(color)
        }
        DeviceOp::Preset(preset) => {
            let color = preset.apply_to(state.color());
            state.set_color(color);
            PendingUpdate::Color(color)
        }
    };
    Staged {
        after: state.clone(),
        update,
    }
}

/// Record the fields the device accepted.
fn write_sent(confirmed: &mut DeviceState, update: &PendingUpdate) {
    match *update {
        PendingUpdate::Power { on } => confirmed.on = Some(on),
        PendingUpdate::Color(color) => confirmed.set_color(color),
    }
}

/// Restore `confirmed` if the field still holds what this operation
/// wrote. Returns whether the field changed.
fn revert<T: PartialEq + Clone>(
    current: &mut Option<T>,
    confirmed: Option<&T>,
    after: Option<&T>,
) -> bool {
    if current.as_ref() == after && current.as_ref() != confirmed {
        *current = confirmed.cloned();
        true
    } else {
        false
    }
}

fn validate(op: DeviceOp) -> Result<(), CoreError> {
    if let DeviceOp::SetChannel { channel, value } = op {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CoreError::ValidationFailed {
                message: format!("{channel} must be between 0 and 1, got {value}"),
            });
        }
    }
    Ok(())
}
