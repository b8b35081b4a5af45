//! Field catalog of the hotel-booking form served next to the prediction
//! endpoint. The server reads these keys and substitutes the listed defaults
//! for anything missing; checks here are only hints for interactive clients.

use crate::{error::FieldError, protocol::FormInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: &'static str,
}

pub const MEAL_PLANS: &[&str] = &["Meal Plan 1", "Meal Plan 2", "Meal Plan 3", "Not Selected"];
pub const ROOM_TYPES: &[&str] = &[
    "Room_Type 1",
    "Room_Type 2",
    "Room_Type 3",
    "Room_Type 4",
    "Room_Type 5",
    "Room_Type 6",
    "Room_Type 7",
];
pub const MARKET_SEGMENTS: &[&str] = &["Aviation", "Complementary", "Corporate", "Offline", "Online"];

pub const BOOKING_FIELDS: &[BookingField] = &[
    BookingField {
        name: "lead time",
        kind: FieldKind::Integer,
        default: "0",
    },
    BookingField {
        name: "average price",
        kind: FieldKind::Decimal,
        default: "0",
    },
    BookingField {
        name: "special requests",
        kind: FieldKind::Integer,
        default: "0",
    },
    BookingField {
        name: "number of week nights",
        kind: FieldKind::Integer,
        default: "0",
    },
    BookingField {
        name: "number of weekend nights",
        kind: FieldKind::Integer,
        default: "0",
    },
    BookingField {
        name: "market segment type",
        kind: FieldKind::Choice(MARKET_SEGMENTS),
        default: "Online",
    },
    BookingField {
        name: "room type",
        kind: FieldKind::Choice(ROOM_TYPES),
        default: "Room_Type 1",
    },
    BookingField {
        name: "number of adults",
        kind: FieldKind::Integer,
        default: "2",
    },
    BookingField {
        name: "type of meal",
        kind: FieldKind::Choice(MEAL_PLANS),
        default: "Meal Plan 1",
    },
    BookingField {
        name: "car parking space",
        kind: FieldKind::Integer,
        default: "0",
    },
];

pub fn find_field(name: &str) -> Option<&'static BookingField> {
    BOOKING_FIELDS.iter().find(|field| field.name == name)
}

impl BookingField {
    pub fn check(&self, value: &str) -> Result<(), FieldError> {
        let value = value.trim();
        match self.kind {
            FieldKind::Integer => value.parse::<i64>().map(|_| ()).map_err(|_| {
                FieldError::NotAnInteger {
                    field: self.name.to_string(),
                    value: value.to_string(),
                }
            }),
            FieldKind::Decimal => value
                .parse::<f64>()
                .ok()
                .filter(|parsed| parsed.is_finite())
                .map(|_| ())
                .ok_or_else(|| FieldError::NotADecimal {
                    field: self.name.to_string(),
                    value: value.to_string(),
                }),
            FieldKind::Choice(options) if options.contains(&value) => Ok(()),
            FieldKind::Choice(options) => Err(FieldError::UnknownChoice {
                field: self.name.to_string(),
                value: value.to_string(),
                allowed: options.join(", "),
            }),
        }
    }

    pub fn describe_kind(&self) -> String {
        match self.kind {
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Decimal => "number".to_string(),
            FieldKind::Choice(options) => format!("one of: {}", options.join(", ")),
        }
    }
}

/// Appends every catalog field the form does not already carry, using the
/// server-side default. Supplied values are left untouched.
pub fn with_defaults(mut form: FormInput) -> FormInput {
    for field in BOOKING_FIELDS {
        if !form.contains(field.name) {
            form.insert(field.name, field.default);
        }
    }
    form
}

/// Runs the catalog checks over every known field in the form. Unknown keys
/// pass through since the form markup may define more than the catalog.
pub fn check_form(form: &FormInput) -> Vec<FieldError> {
    form.iter()
        .filter_map(|(name, value)| find_field(name).map(|field| field.check(value)))
        .filter_map(Result::err)
        .collect()
}
