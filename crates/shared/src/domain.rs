use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(DeviceId);
id_newtype!(CalendarId);
id_newtype!(PlanId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Dashboard,
    Calendar,
}

/// Wall-clock format shown on a device, serialized as the literal 12/24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClockType {
    Hours12,
    Hours24,
}

impl From<ClockType> for u8 {
    fn from(value: ClockType) -> Self {
        match value {
            ClockType::Hours12 => 12,
            ClockType::Hours24 => 24,
        }
    }
}

impl TryFrom<u8> for ClockType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            12 => Ok(ClockType::Hours12),
            24 => Ok(ClockType::Hours24),
            other => Err(format!("invalid clock type {other}, expected 12 or 24")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_type: DeviceType,
    pub calendar_id: Option<CalendarId>,
    pub language: String,
    pub clock_type: ClockType,
    pub show_available_rooms: bool,
    pub minutes_for_check_in: u32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub ms_since_last_activity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: CalendarId,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub display_name: String,
    pub subscription_passthrough: String,
    pub subscription_plan_id: Option<PlanId>,
    pub subscription_update_url: Option<String>,
}

/// Full configurable field set of a device, as accepted by the
/// device-options endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOptions {
    pub device_type: DeviceType,
    pub calendar_id: Option<CalendarId>,
    pub language: String,
    pub minutes_for_check_in: u32,
    pub show_available_rooms: bool,
    pub clock_type: ClockType,
}
