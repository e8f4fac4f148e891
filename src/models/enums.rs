use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation and the stored value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Practitioner => "practitioner",
    Admin => "admin",
});

str_enum!(AppointmentType {
    New => "new",
    FollowUp => "follow-up",
    Online => "online",
    InPerson => "in-person",
});

impl Default for AppointmentType {
    fn default() -> Self {
        Self::Online
    }
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    Missed => "missed",
});

str_enum!(PaymentMethod {
    Upi => "UPI",
    Card => "card",
    NetBanking => "netbanking",
    Cash => "cash",
});

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Upi
    }
}

str_enum!(PaymentStatus {
    Paid => "paid",
    Pending => "pending",
    Failed => "failed",
    Refunded => "refunded",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_type_uses_hyphenated_names() {
        assert_eq!(AppointmentType::FollowUp.as_str(), "follow-up");
        assert_eq!(
            AppointmentType::from_str("in-person").unwrap(),
            AppointmentType::InPerson
        );
        assert_eq!(AppointmentType::default(), AppointmentType::Online);
    }

    #[test]
    fn payment_method_serde_matches_storage() {
        let json = serde_json::to_string(&PaymentMethod::Upi).unwrap();
        assert_eq!(json, "\"UPI\"");
        let parsed: PaymentMethod = serde_json::from_str("\"netbanking\"").unwrap();
        assert_eq!(parsed, PaymentMethod::NetBanking);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Upi);
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Practitioner.to_string(), "practitioner");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("doctor").is_err());
        assert!(AppointmentStatus::from_str("").is_err());
        assert!(PaymentStatus::from_str("PAID").is_err());
        let err = PaymentMethod::from_str("cheque").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }
}
