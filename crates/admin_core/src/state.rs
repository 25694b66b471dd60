//! State tree and reducer for the admin console. All mutation flows through
//! [`AdminState::apply`]; asynchronous flows in the crate root dispatch the
//! same actions the UI layer does.

use std::collections::HashMap;

use shared::domain::{Calendar, CalendarId, ClockType, Device, DeviceId, DeviceType, User};

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub calendars: HashMap<CalendarId, Calendar>,
    pub devices: DeviceListState,
    pub user: Option<User>,
    pub connect_wizard: ConnectWizardState,
    pub edit_dialog: EditDeviceState,
    pub remove_dialog: RemoveDeviceState,
    pub monetization: MonetizationState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceListState {
    pub is_loaded: bool,
    pub data: Vec<Device>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectWizardStep {
    #[default]
    Hidden,
    EnterCode,
    ChooseType,
    Configure,
}

/// Ephemeral draft owned by the pairing wizard. `device_id` stays unset until
/// the connection code has been accepted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceDraft {
    pub connection_code: String,
    pub device_id: Option<DeviceId>,
    pub device_type: DeviceType,
    pub calendar_id: Option<CalendarId>,
    pub language: String,
    pub clock_type: ClockType,
    pub show_available_rooms: bool,
}

impl Default for NewDeviceDraft {
    fn default() -> Self {
        Self {
            connection_code: String::new(),
            device_id: None,
            device_type: DeviceType::Calendar,
            calendar_id: None,
            language: "en".to_string(),
            clock_type: ClockType::Hours24,
            show_available_rooms: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectWizardState {
    pub step: ConnectWizardStep,
    pub is_submitting: bool,
    pub error_message: Option<String>,
    pub draft: NewDeviceDraft,
}

/// Editable snapshot of an existing device, seeded when the edit dialog
/// opens and discarded when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDeviceDraft {
    pub device_id: DeviceId,
    pub device_type: DeviceType,
    pub calendar_id: Option<CalendarId>,
    pub language: String,
    pub minutes_for_check_in: u32,
    pub show_available_rooms: bool,
    pub clock_type: ClockType,
}

impl EditDeviceDraft {
    pub fn from_device(device: &Device) -> Self {
        Self {
            device_id: device.id.clone(),
            device_type: device.device_type,
            calendar_id: device.calendar_id.clone(),
            language: device.language.clone(),
            minutes_for_check_in: device.minutes_for_check_in,
            show_available_rooms: device.show_available_rooms,
            clock_type: device.clock_type,
        }
    }
}

/// `draft` is `Some` exactly while the dialog is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDeviceState {
    pub draft: Option<EditDeviceDraft>,
    pub is_submitting: bool,
    pub error_message: Option<String>,
}

/// Keyed by the target device id only; `device_id` is `Some` exactly while
/// the dialog is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveDeviceState {
    pub device_id: Option<DeviceId>,
    pub is_submitting: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonetizationState {
    pub is_checkout_overlay_open: bool,
    pub is_updating_subscription: bool,
    pub is_plan_dialog_open: bool,
    pub is_cancel_subscription_dialog_open: bool,
}

#[derive(Debug, Clone)]
pub enum Action {
    SetCalendars(HashMap<CalendarId, Calendar>),
    SetDevices(Vec<Device>),
    SetUser(User),
    ConnectWizard(ConnectWizardAction),
    EditDevice(EditDeviceAction),
    RemoveDevice(RemoveDeviceAction),
    Monetization(MonetizationAction),
}

#[derive(Debug, Clone)]
pub enum ConnectWizardAction {
    Show,
    Hide,
    SetConnectionCode(String),
    SubmitStarted,
    CodeAccepted(DeviceId),
    SubmitFailed(String),
    SetDeviceType(DeviceType),
    NextStep,
    PreviousStep,
    SetCalendarId(Option<CalendarId>),
    SetLanguage(String),
    SetClockType(ClockType),
    SetShowAvailableRooms(bool),
}

#[derive(Debug, Clone)]
pub enum EditDeviceAction {
    Show(Device),
    Hide,
    SetDeviceType(DeviceType),
    SetCalendarId(Option<CalendarId>),
    SetLanguage(String),
    SetClockType(ClockType),
    SetMinutesForCheckIn(u32),
    SetShowAvailableRooms(bool),
    SubmitStarted,
    SubmitFailed(String),
}

#[derive(Debug, Clone)]
pub enum RemoveDeviceAction {
    Show(DeviceId),
    Hide,
    SubmitStarted,
    SubmitFailed(String),
}

#[derive(Debug, Clone)]
pub enum MonetizationAction {
    SetCheckoutOverlayOpen(bool),
    SetUpdatingSubscription(bool),
    OpenPlanDialog,
    ClosePlanDialog,
    OpenCancelSubscriptionDialog,
    CloseCancelSubscriptionDialog,
}

impl AdminState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SetCalendars(calendars) => self.calendars = calendars,
            Action::SetDevices(devices) => {
                // Always a full replacement snapshot, never a partial patch.
                self.devices.is_loaded = true;
                self.devices.data = devices;
            }
            Action::SetUser(user) => self.user = Some(user),
            Action::ConnectWizard(action) => self.connect_wizard.apply(action),
            Action::EditDevice(action) => self.edit_dialog.apply(action),
            Action::RemoveDevice(action) => self.remove_dialog.apply(action),
            Action::Monetization(action) => self.monetization.apply(action),
        }
    }
}

impl ConnectWizardState {
    fn apply(&mut self, action: ConnectWizardAction) {
        match action {
            ConnectWizardAction::Show => {
                // Fresh draft on every show; nothing survives a previous run.
                *self = Self {
                    step: ConnectWizardStep::EnterCode,
                    ..Self::default()
                };
            }
            ConnectWizardAction::Hide => *self = Self::default(),
            ConnectWizardAction::SetConnectionCode(code) => self.draft.connection_code = code,
            ConnectWizardAction::SubmitStarted => {
                self.is_submitting = true;
                self.error_message = None;
            }
            ConnectWizardAction::CodeAccepted(device_id) => {
                self.is_submitting = false;
                self.error_message = None;
                self.draft.device_id = Some(device_id);
                self.step = ConnectWizardStep::ChooseType;
            }
            ConnectWizardAction::SubmitFailed(message) => {
                self.is_submitting = false;
                self.error_message = Some(message);
            }
            ConnectWizardAction::SetDeviceType(device_type) => {
                self.draft.device_type = device_type;
            }
            ConnectWizardAction::NextStep => self.step = ConnectWizardStep::Configure,
            ConnectWizardAction::PreviousStep => self.step = ConnectWizardStep::ChooseType,
            ConnectWizardAction::SetCalendarId(calendar_id) => {
                self.draft.calendar_id = calendar_id;
            }
            ConnectWizardAction::SetLanguage(language) => self.draft.language = language,
            ConnectWizardAction::SetClockType(clock_type) => self.draft.clock_type = clock_type,
            ConnectWizardAction::SetShowAvailableRooms(show) => {
                self.draft.show_available_rooms = show;
            }
        }
    }
}

impl EditDeviceState {
    fn apply(&mut self, action: EditDeviceAction) {
        match action {
            EditDeviceAction::Show(device) => {
                *self = Self {
                    draft: Some(EditDeviceDraft::from_device(&device)),
                    ..Self::default()
                };
            }
            EditDeviceAction::Hide => *self = Self::default(),
            EditDeviceAction::SubmitStarted => {
                self.is_submitting = true;
                self.error_message = None;
            }
            EditDeviceAction::SubmitFailed(message) => {
                self.is_submitting = false;
                self.error_message = Some(message);
            }
            EditDeviceAction::SetDeviceType(device_type) => {
                self.with_draft(|draft| draft.device_type = device_type);
            }
            EditDeviceAction::SetCalendarId(calendar_id) => {
                self.with_draft(|draft| draft.calendar_id = calendar_id);
            }
            EditDeviceAction::SetLanguage(language) => {
                self.with_draft(|draft| draft.language = language);
            }
            EditDeviceAction::SetClockType(clock_type) => {
                self.with_draft(|draft| draft.clock_type = clock_type);
            }
            EditDeviceAction::SetMinutesForCheckIn(minutes) => {
                self.with_draft(|draft| draft.minutes_for_check_in = minutes);
            }
            EditDeviceAction::SetShowAvailableRooms(show) => {
                self.with_draft(|draft| draft.show_available_rooms = show);
            }
        }
    }

    fn with_draft(&mut self, edit: impl FnOnce(&mut EditDeviceDraft)) {
        if let Some(draft) = &mut self.draft {
            edit(draft);
        }
    }
}

impl RemoveDeviceState {
    fn apply(&mut self, action: RemoveDeviceAction) {
        match action {
            RemoveDeviceAction::Show(device_id) => {
                *self = Self {
                    device_id: Some(device_id),
                    ..Self::default()
                };
            }
            RemoveDeviceAction::Hide => *self = Self::default(),
            RemoveDeviceAction::SubmitStarted => {
                self.is_submitting = true;
                self.error_message = None;
            }
            RemoveDeviceAction::SubmitFailed(message) => {
                self.is_submitting = false;
                self.error_message = Some(message);
            }
        }
    }
}

impl MonetizationState {
    fn apply(&mut self, action: MonetizationAction) {
        match action {
            MonetizationAction::SetCheckoutOverlayOpen(open) => {
                self.is_checkout_overlay_open = open;
            }
            MonetizationAction::SetUpdatingSubscription(updating) => {
                self.is_updating_subscription = updating;
            }
            MonetizationAction::OpenPlanDialog => self.is_plan_dialog_open = true,
            MonetizationAction::ClosePlanDialog => self.is_plan_dialog_open = false,
            MonetizationAction::OpenCancelSubscriptionDialog => {
                self.is_cancel_subscription_dialog_open = true;
            }
            MonetizationAction::CloseCancelSubscriptionDialog => {
                self.is_cancel_subscription_dialog_open = false;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
