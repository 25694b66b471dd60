//! Client-side orchestration for the room-booking device admin console:
//! the device pairing wizard, the edit/remove dialogs, and the subscription
//! lifecycle controller. The server owns the device list and subscription
//! plan; every mutation here re-fetches the affected snapshot instead of
//! patching local copies.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use checkout_integration::{CheckoutOutcome, CheckoutRequest, CheckoutWidget};
use shared::{
    domain::{Calendar, CalendarId, Device, DeviceId, DeviceOptions, PlanId, User},
    error::{ApiException, ErrorCode},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::warn;

pub mod http;
pub mod selectors;
pub mod state;

use state::{
    Action, AdminState, ConnectWizardAction, EditDeviceAction, MonetizationAction,
    RemoveDeviceAction,
};

pub const SUBSCRIPTION_POLL_INTERVAL: Duration = Duration::from_millis(2000);
const CHECKOUT_LOCALE: &str = "en";

pub const INVALID_CONNECTION_CODE_MESSAGE: &str = "Invalid connection code";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error. Please try again later";
const CANCEL_SUBSCRIPTION_FAILED_ALERT: &str =
    "Unable to cancel subscription. Please contact support.";
const CHANGE_PLAN_FAILED_ALERT: &str =
    "Unable to change subscription plan. Please contact support.";

pub type ApiResult<T> = std::result::Result<T, ApiException>;

/// The admin service endpoints this core calls. Transport and auth live
/// behind the implementation; see [`http::HttpAdminApi`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn get_calendars(&self) -> ApiResult<HashMap<CalendarId, Calendar>>;
    async fn get_connected_devices(&self) -> ApiResult<Vec<Device>>;
    async fn get_user_details(&self) -> ApiResult<User>;
    async fn connect_device(&self, connection_code: &str) -> ApiResult<Device>;
    async fn set_device_options(
        &self,
        device_id: &DeviceId,
        options: &DeviceOptions,
    ) -> ApiResult<()>;
    async fn disconnect_device(&self, device_id: &DeviceId) -> ApiResult<()>;
    async fn set_subscription_plan(&self, plan_id: &PlanId) -> ApiResult<()>;
    async fn cancel_subscription(&self) -> ApiResult<()>;
}

pub struct MissingCheckoutWidget;

#[async_trait]
impl CheckoutWidget for MissingCheckoutWidget {
    async fn open(&self, _request: CheckoutRequest) -> CheckoutOutcome {
        warn!("checkout widget is unavailable; reporting the overlay as closed");
        CheckoutOutcome::Closed
    }
}

/// Which slice of [`AdminState`] an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSlice {
    Calendars,
    Devices,
    User,
    ConnectWizard,
    EditDevice,
    RemoveDevice,
    Monetization,
}

#[derive(Debug, Clone)]
pub enum AdminEvent {
    StateChanged(StateSlice),
    /// A failure the user must acknowledge; no automatic retry follows.
    Alert(String),
}

fn slice_of(action: &Action) -> StateSlice {
    match action {
        Action::SetCalendars(_) => StateSlice::Calendars,
        Action::SetDevices(_) => StateSlice::Devices,
        Action::SetUser(_) => StateSlice::User,
        Action::ConnectWizard(_) => StateSlice::ConnectWizard,
        Action::EditDevice(_) => StateSlice::EditDevice,
        Action::RemoveDevice(_) => StateSlice::RemoveDevice,
        Action::Monetization(_) => StateSlice::Monetization,
    }
}

struct OverlayContext {
    starting_plan: Option<PlanId>,
    passthrough: String,
    override_url: Option<String>,
}

pub struct AdminClient {
    api: Arc<dyn AdminApi>,
    checkout: Arc<dyn CheckoutWidget>,
    state: Mutex<AdminState>,
    events: broadcast::Sender<AdminEvent>,
    checkout_task: Mutex<Option<JoinHandle<()>>>,
    subscription_poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl AdminClient {
    pub fn new(api: Arc<dyn AdminApi>) -> Arc<Self> {
        Self::new_with_checkout(api, Arc::new(MissingCheckoutWidget))
    }

    pub fn new_with_checkout(
        api: Arc<dyn AdminApi>,
        checkout: Arc<dyn CheckoutWidget>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            checkout,
            state: Mutex::new(AdminState::default()),
            events,
            checkout_task: Mutex::new(None),
            subscription_poll_task: Mutex::new(None),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AdminState {
        self.state.lock().await.clone()
    }

    pub async fn with_state<R>(&self, read: impl FnOnce(&AdminState) -> R) -> R {
        let guard = self.state.lock().await;
        read(&guard)
    }

    /// Single mutation entry point. View code never writes state directly;
    /// it dispatches an [`Action`] and re-reads through the selectors.
    pub async fn dispatch(&self, action: Action) {
        let slice = slice_of(&action);
        self.state.lock().await.apply(action);
        let _ = self.events.send(AdminEvent::StateChanged(slice));
    }

    fn alert(&self, message: &str) {
        let _ = self.events.send(AdminEvent::Alert(message.to_string()));
    }

    /// Flips a submitting guard and snapshots the draft in one critical
    /// section. Returns `None` when a submit for the same draft is already
    /// in flight, making resubmission a no-op rather than a second call.
    async fn begin_submit<R>(
        &self,
        slice: StateSlice,
        begin: impl FnOnce(&mut AdminState) -> Option<R>,
    ) -> Option<R> {
        let result = {
            let mut guard = self.state.lock().await;
            begin(&mut guard)
        };
        if result.is_some() {
            let _ = self.events.send(AdminEvent::StateChanged(slice));
        }
        result
    }

    pub async fn initial_fetch(&self) -> ApiResult<()> {
        let (calendars, devices, user) = tokio::try_join!(
            self.api.get_calendars(),
            self.api.get_connected_devices(),
            self.api.get_user_details(),
        )?;

        self.dispatch(Action::SetCalendars(calendars)).await;
        self.dispatch(Action::SetUser(user)).await;
        self.dispatch(Action::SetDevices(devices)).await;
        Ok(())
    }

    async fn refresh_devices(&self) -> ApiResult<()> {
        let devices = self.api.get_connected_devices().await?;
        self.dispatch(Action::SetDevices(devices)).await;
        Ok(())
    }

    async fn refresh_user(&self) -> ApiResult<()> {
        let user = self.api.get_user_details().await?;
        self.dispatch(Action::SetUser(user)).await;
        Ok(())
    }

    /// Opens the pairing wizard, or the plan dialog when the current plan
    /// does not allow another device.
    pub async fn show_connect_wizard(&self) {
        let eligible = self.with_state(selectors::can_connect_another_device).await;
        if eligible {
            self.dispatch(Action::ConnectWizard(ConnectWizardAction::Show))
                .await;
        } else {
            self.dispatch(Action::Monetization(MonetizationAction::OpenPlanDialog))
                .await;
        }
    }

    pub async fn hide_connect_wizard(&self) {
        self.dispatch(Action::ConnectWizard(ConnectWizardAction::Hide))
            .await;
    }

    pub async fn show_edit_device(&self, device: Device) {
        self.dispatch(Action::EditDevice(EditDeviceAction::Show(device)))
            .await;
    }

    pub async fn hide_edit_device(&self) {
        self.dispatch(Action::EditDevice(EditDeviceAction::Hide)).await;
    }

    pub async fn show_remove_device(&self, device_id: DeviceId) {
        self.dispatch(Action::RemoveDevice(RemoveDeviceAction::Show(device_id)))
            .await;
    }

    pub async fn hide_remove_device(&self) {
        self.dispatch(Action::RemoveDevice(RemoveDeviceAction::Hide))
            .await;
    }

    pub async fn submit_connection_code(&self) {
        let Some(connection_code) = self
            .begin_submit(StateSlice::ConnectWizard, |state| {
                if state.connect_wizard.is_submitting {
                    return None;
                }
                state.apply(Action::ConnectWizard(ConnectWizardAction::SubmitStarted));
                Some(state.connect_wizard.draft.connection_code.clone())
            })
            .await
        else {
            return;
        };

        match self.api.connect_device(&connection_code).await {
            Ok(device) => {
                self.dispatch(Action::ConnectWizard(ConnectWizardAction::CodeAccepted(
                    device.id,
                )))
                .await;
            }
            Err(err) => {
                let message = if err.is_not_found() {
                    INVALID_CONNECTION_CODE_MESSAGE
                } else {
                    UNKNOWN_ERROR_MESSAGE
                };
                self.dispatch(Action::ConnectWizard(ConnectWizardAction::SubmitFailed(
                    message.to_string(),
                )))
                .await;
            }
        }
    }

    /// Final wizard step: configure the freshly paired device, then refresh
    /// both the device list and the subscription snapshot (pairing counts
    /// against plan usage).
    pub async fn submit_new_device(&self) {
        let Some(draft) = self
            .begin_submit(StateSlice::ConnectWizard, |state| {
                if state.connect_wizard.is_submitting {
                    return None;
                }
                state.apply(Action::ConnectWizard(ConnectWizardAction::SubmitStarted));
                Some(state.connect_wizard.draft.clone())
            })
            .await
        else {
            return;
        };

        let result = async {
            let device_id = draft.device_id.clone().ok_or_else(|| {
                ApiException::new(ErrorCode::Validation, "no device has been paired yet")
            })?;

            let options = DeviceOptions {
                device_type: draft.device_type,
                calendar_id: draft.calendar_id.clone(),
                language: draft.language.clone(),
                // Check-in is configured later from the edit dialog.
                minutes_for_check_in: 0,
                show_available_rooms: draft.show_available_rooms,
                clock_type: draft.clock_type,
            };

            self.api.set_device_options(&device_id, &options).await?;
            self.refresh_devices().await?;
            self.refresh_user().await?;
            Ok::<_, ApiException>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.dispatch(Action::ConnectWizard(ConnectWizardAction::Hide))
                    .await;
            }
            Err(err) => {
                warn!(error = %err, "pairing wizard: device configuration failed");
                self.dispatch(Action::ConnectWizard(ConnectWizardAction::SubmitFailed(
                    UNKNOWN_ERROR_MESSAGE.to_string(),
                )))
                .await;
            }
        }
    }

    pub async fn submit_edit_device(&self) {
        let Some(draft) = self
            .begin_submit(StateSlice::EditDevice, |state| {
                if state.edit_dialog.is_submitting {
                    return None;
                }
                let draft = state.edit_dialog.draft.clone()?;
                state.apply(Action::EditDevice(EditDeviceAction::SubmitStarted));
                Some(draft)
            })
            .await
        else {
            return;
        };

        let options = DeviceOptions {
            device_type: draft.device_type,
            calendar_id: draft.calendar_id.clone(),
            language: draft.language.clone(),
            minutes_for_check_in: draft.minutes_for_check_in,
            show_available_rooms: draft.show_available_rooms,
            clock_type: draft.clock_type,
        };

        let result = async {
            self.api.set_device_options(&draft.device_id, &options).await?;
            self.refresh_devices().await?;
            self.dispatch(Action::EditDevice(EditDeviceAction::Hide)).await;
            Ok::<_, ApiException>(())
        }
        .await;

        if let Err(err) = result {
            warn!(device_id = %draft.device_id, error = %err, "edit device: submit failed");
            self.dispatch(Action::EditDevice(EditDeviceAction::SubmitFailed(
                UNKNOWN_ERROR_MESSAGE.to_string(),
            )))
            .await;
        }
    }

    pub async fn submit_remove_device(&self) {
        let Some(device_id) = self
            .begin_submit(StateSlice::RemoveDevice, |state| {
                if state.remove_dialog.is_submitting {
                    return None;
                }
                let device_id = state.remove_dialog.device_id.clone()?;
                state.apply(Action::RemoveDevice(RemoveDeviceAction::SubmitStarted));
                Some(device_id)
            })
            .await
        else {
            return;
        };

        let result = async {
            self.api.disconnect_device(&device_id).await?;
            self.refresh_devices().await?;
            self.dispatch(Action::RemoveDevice(RemoveDeviceAction::Hide))
                .await;
            Ok::<_, ApiException>(())
        }
        .await;

        if let Err(err) = result {
            warn!(device_id = %device_id, error = %err, "remove device: submit failed");
            self.dispatch(Action::RemoveDevice(RemoveDeviceAction::SubmitFailed(
                UNKNOWN_ERROR_MESSAGE.to_string(),
            )))
            .await;
        }
    }

    /// Flips the overlay flag and captures everything the checkout task
    /// needs in one critical section; `None` means an overlay is already
    /// open and the call is a no-op.
    async fn try_open_overlay(&self) -> Option<OverlayContext> {
        let context = {
            let mut guard = self.state.lock().await;
            if selectors::is_checkout_overlay_open(&guard) {
                return None;
            }
            let context = OverlayContext {
                starting_plan: selectors::current_subscription_plan(&guard).cloned(),
                passthrough: selectors::subscription_passthrough(&guard)
                    .unwrap_or_default()
                    .to_string(),
                override_url: selectors::subscription_update_url(&guard).map(str::to_string),
            };
            guard.apply(Action::Monetization(
                MonetizationAction::SetCheckoutOverlayOpen(true),
            ));
            context
        };
        let _ = self
            .events
            .send(AdminEvent::StateChanged(StateSlice::Monetization));
        Some(context)
    }

    async fn track_checkout_task(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.checkout_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Starts a new-purchase checkout. The plan id captured before the
    /// overlay opens is what the subscription poll compares against after a
    /// successful checkout.
    pub async fn open_checkout_overlay(self: &Arc<Self>, product: PlanId) {
        let Some(context) = self.try_open_overlay().await else {
            return;
        };

        let request = CheckoutRequest {
            product: Some(product),
            override_url: None,
            locale: CHECKOUT_LOCALE.to_string(),
            passthrough: context.passthrough,
        };

        let client = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = client.checkout.open(request).await;
            client
                .dispatch(Action::Monetization(
                    MonetizationAction::SetCheckoutOverlayOpen(false),
                ))
                .await;
            if outcome == CheckoutOutcome::Succeeded {
                client
                    .refresh_subscription_until_plan_changes(context.starting_plan)
                    .await;
            }
        });
        self.track_checkout_task(handle).await;
    }

    /// Opens the billing provider's update flow. An update may keep the
    /// same plan id, so no subscription poll is started on success.
    pub async fn open_update_subscription_overlay(self: &Arc<Self>) {
        let Some(context) = self.try_open_overlay().await else {
            return;
        };

        let request = CheckoutRequest {
            product: None,
            override_url: context.override_url,
            locale: CHECKOUT_LOCALE.to_string(),
            passthrough: context.passthrough,
        };

        let client = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _ = client.checkout.open(request).await;
            client
                .dispatch(Action::Monetization(
                    MonetizationAction::SetCheckoutOverlayOpen(false),
                ))
                .await;
        });
        self.track_checkout_task(handle).await;
    }

    pub async fn confirm_cancel_subscription(self: &Arc<Self>) {
        let starting_plan = self
            .with_state(|state| selectors::current_subscription_plan(state).cloned())
            .await;

        match self.api.cancel_subscription().await {
            Ok(()) => {
                self.dispatch(Action::Monetization(
                    MonetizationAction::CloseCancelSubscriptionDialog,
                ))
                .await;
                self.refresh_subscription_until_plan_changes(starting_plan)
                    .await;
            }
            Err(err) => {
                warn!(error = %err, "subscription: cancellation failed");
                self.alert(CANCEL_SUBSCRIPTION_FAILED_ALERT);
            }
        }
    }

    /// First purchase goes through the checkout overlay; with a plan
    /// already active the change is a direct service call.
    pub async fn select_subscription_plan(self: &Arc<Self>, plan_id: PlanId) {
        let starting_plan = self
            .with_state(|state| selectors::current_subscription_plan(state).cloned())
            .await;

        if starting_plan.is_none() {
            self.open_checkout_overlay(plan_id).await;
            return;
        }

        match self.api.set_subscription_plan(&plan_id).await {
            Ok(()) => {
                self.refresh_subscription_until_plan_changes(starting_plan)
                    .await;
            }
            Err(err) => {
                warn!(plan_id = %plan_id, error = %err, "subscription: plan change failed");
                self.alert(CHANGE_PLAN_FAILED_ALERT);
            }
        }
    }

    /// Re-fetches the user snapshot every [`SUBSCRIPTION_POLL_INTERVAL`]
    /// until the stored plan id no longer equals `starting_plan`. The
    /// billing provider propagates checkout and cancellation results
    /// asynchronously; the observed change is the only terminal condition.
    /// The task is owned by the client and aborted by [`AdminClient::shutdown`].
    async fn refresh_subscription_until_plan_changes(
        self: &Arc<Self>,
        starting_plan: Option<PlanId>,
    ) {
        self.dispatch(Action::Monetization(
            MonetizationAction::SetUpdatingSubscription(true),
        ))
        .await;

        let client = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                let current = client
                    .with_state(|state| selectors::current_subscription_plan(state).cloned())
                    .await;
                if current != starting_plan {
                    break;
                }
                tokio::time::sleep(SUBSCRIPTION_POLL_INTERVAL).await;
                match client.api.get_user_details().await {
                    Ok(user) => client.dispatch(Action::SetUser(user)).await,
                    Err(err) => {
                        warn!(error = %err, "subscription refresh fetch failed; retrying")
                    }
                }
            }
            client
                .dispatch(Action::Monetization(
                    MonetizationAction::SetUpdatingSubscription(false),
                ))
                .await;
        });

        if let Some(previous) = self.subscription_poll_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Stops background work owned by the client. The owning UI scope calls
    /// this on teardown so an in-flight poll or checkout wait cannot keep
    /// dispatching into a discarded session.
    pub async fn shutdown(&self) {
        if let Some(task) = self.checkout_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.subscription_poll_task.lock().await.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
