//! Pure derivations over [`AdminState`]. The UI layer reads exclusively
//! through these; asynchronous flows reuse them under the state lock.

use shared::domain::{Calendar, Device, DeviceId, PlanId};

use crate::state::{AdminState, EditDeviceDraft, NewDeviceDraft};

/// Devices allowed before any paid subscription is active.
pub const FREE_PLAN_DEVICE_LIMIT: usize = 1;

pub fn current_subscription_plan(state: &AdminState) -> Option<&PlanId> {
    state
        .user
        .as_ref()
        .and_then(|user| user.subscription_plan_id.as_ref())
}

pub fn subscription_passthrough(state: &AdminState) -> Option<&str> {
    state
        .user
        .as_ref()
        .map(|user| user.subscription_passthrough.as_str())
}

pub fn subscription_update_url(state: &AdminState) -> Option<&str> {
    state
        .user
        .as_ref()
        .and_then(|user| user.subscription_update_url.as_deref())
}

pub fn can_connect_another_device(state: &AdminState) -> bool {
    if current_subscription_plan(state).is_some() {
        return true;
    }
    state.devices.data.len() < FREE_PLAN_DEVICE_LIMIT
}

pub fn new_device_draft(state: &AdminState) -> &NewDeviceDraft {
    &state.connect_wizard.draft
}

pub fn edit_device_draft(state: &AdminState) -> Option<&EditDeviceDraft> {
    state.edit_dialog.draft.as_ref()
}

pub fn removed_device_id(state: &AdminState) -> Option<&DeviceId> {
    state.remove_dialog.device_id.as_ref()
}

pub fn is_checkout_overlay_open(state: &AdminState) -> bool {
    state.monetization.is_checkout_overlay_open
}

pub fn is_updating_subscription(state: &AdminState) -> bool {
    state.monetization.is_updating_subscription
}

pub fn is_plan_dialog_open(state: &AdminState) -> bool {
    state.monetization.is_plan_dialog_open
}

pub fn is_cancel_subscription_dialog_open(state: &AdminState) -> bool {
    state.monetization.is_cancel_subscription_dialog_open
}

/// A device joined with the calendar it displays, if any.
#[derive(Debug, Clone, Copy)]
pub struct DeviceRow<'a> {
    pub device: &'a Device,
    pub calendar: Option<&'a Calendar>,
}

pub fn devices_with_calendars(state: &AdminState) -> Vec<DeviceRow<'_>> {
    state
        .devices
        .data
        .iter()
        .map(|device| DeviceRow {
            device,
            calendar: device
                .calendar_id
                .as_ref()
                .and_then(|id| state.calendars.get(id)),
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/selectors_tests.rs"]
mod tests;
