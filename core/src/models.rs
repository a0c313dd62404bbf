use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Deposit,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Deposit => "deposit",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "deposit" => Some(PaymentStatus::Deposit),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// One reservable dive session. Multi-day bookings carry `end_date_unix`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub site_id: SiteId,
    pub dive_date_unix: i64,
    pub end_date_unix: Option<i64>,
    pub group_name: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

impl Booking {
    /// Only open-ended, grouped bookings take part in consolidation.
    pub fn is_consolidation_candidate(&self) -> bool {
        self.end_date_unix.is_none() && self.group_name.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub site_id: SiteId,
    pub dive_date_unix: i64,
    pub group_name: Option<String>,
    pub status: BookingStatus,
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            site_id: self.site_id,
            dive_date_unix: self.dive_date_unix,
            end_date_unix: None,
            group_name: self.group_name,
            status: self.status,
            payment_status: PaymentStatus::Unpaid,
            notes: self.notes,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    Green,
    Yellow,
    Red,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Green => "green",
            FlagStatus::Yellow => "yellow",
            FlagStatus::Red => "red",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "green" => Some(FlagStatus::Green),
            "yellow" => Some(FlagStatus::Yellow),
            "red" => Some(FlagStatus::Red),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionFlag {
    pub status: FlagStatus,
    pub reason: String,
}

/// Raw values from the conditions form, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingInput {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub wave_height_m: f64,
    pub tide_status: String,
}

/// The current reading for a booking. Flag fields are stored as computed at
/// submission time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    pub booking_id: BookingId,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub wave_height_m: f64,
    pub tide_status: String,
    pub flag_status: FlagStatus,
    pub flag_reason: String,
    pub recorded_at_unix: i64,
}
