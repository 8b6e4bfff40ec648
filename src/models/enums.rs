use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The storage string doubles as the wire name.
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

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Examined => "examined",
});

str_enum!(MedicationItemStatus {
    Pending => "pending",
    Processed => "processed",
});

// Stored as the Indonesian initials used on registration forms.
str_enum!(Sex {
    Male => "L",
    Female => "P",
});

str_enum!(LineItemCategory {
    Medication => "medication",
    Procedure => "procedure",
    Diagnosis => "diagnosis",
});

str_enum!(Capability {
    View => "view",
    Create => "create",
    Edit => "edit",
    Delete => "delete",
    Access => "access",
});

// Appointment code format chosen per deployment.
str_enum!(AppointmentCodeScheme {
    Poli => "poli",
    Daily => "daily",
    DailySuffixed => "daily-suffixed",
});

impl Capability {
    /// Privilege column backing this capability.
    pub fn column(&self) -> &'static str {
        match self {
            Capability::View => "can_view",
            Capability::Create => "can_create",
            Capability::Edit => "can_edit",
            Capability::Delete => "can_delete",
            Capability::Access => "can_access",
        }
    }
}

impl LineItemCategory {
    /// Table holding this category's line items.
    pub fn table(&self) -> &'static str {
        match self {
            LineItemCategory::Medication => "visit_medications",
            LineItemCategory::Procedure => "visit_procedures",
            LineItemCategory::Diagnosis => "visit_diagnoses",
        }
    }

    /// Human label used in error messages.
    pub fn catalog_label(&self) -> &'static str {
        match self {
            LineItemCategory::Medication => "Medicine",
            LineItemCategory::Procedure => "Service",
            LineItemCategory::Diagnosis => "Diagnosis",
        }
    }
}
