//! The ten input fields and the two fixed-shape records built from them.
//!
//! `FormState` holds what the user typed; `FeatureVector` holds the validated
//! numbers that go over the wire. Both have one named slot per field, so a
//! missing or misspelled key cannot exist.

use std::fmt;

use serde::Serialize;

/// One of the ten standardized inputs, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Age,
    Sex,
    Bmi,
    Bp,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
}

/// Static display metadata for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub help: &'static str,
}

const FIELD_SPECS: [FieldSpec; 10] = [
    FieldSpec {
        label: "Age",
        help: "Age in years (standardized)",
    },
    FieldSpec {
        label: "Sex",
        help: "Sex (standardized)",
    },
    FieldSpec {
        label: "BMI",
        help: "Body mass index (standardized)",
    },
    FieldSpec {
        label: "Blood Pressure",
        help: "Average blood pressure (standardized)",
    },
    FieldSpec {
        label: "S1 (tc)",
        help: "Total serum cholesterol",
    },
    FieldSpec {
        label: "S2 (ldl)",
        help: "Low-density lipoproteins",
    },
    FieldSpec {
        label: "S3 (hdl)",
        help: "High-density lipoproteins",
    },
    FieldSpec {
        label: "S4 (tch)",
        help: "Total cholesterol / HDL",
    },
    FieldSpec {
        label: "S5 (ltg)",
        help: "Log of serum triglycerides level",
    },
    FieldSpec {
        label: "S6 (glu)",
        help: "Blood sugar level",
    },
];

impl FieldKey {
    /// All fields in declared order. Validation and rendering iterate this.
    pub const ALL: [FieldKey; 10] = [
        FieldKey::Age,
        FieldKey::Sex,
        FieldKey::Bmi,
        FieldKey::Bp,
        FieldKey::S1,
        FieldKey::S2,
        FieldKey::S3,
        FieldKey::S4,
        FieldKey::S5,
        FieldKey::S6,
    ];

    /// Position in declared order.
    pub fn index(self) -> usize {
        match self {
            FieldKey::Age => 0,
            FieldKey::Sex => 1,
            FieldKey::Bmi => 2,
            FieldKey::Bp => 3,
            FieldKey::S1 => 4,
            FieldKey::S2 => 5,
            FieldKey::S3 => 6,
            FieldKey::S4 => 7,
            FieldKey::S5 => 8,
            FieldKey::S6 => 9,
        }
    }

    /// JSON key used in the request body.
    pub fn wire_name(self) -> &'static str {
        match self {
            FieldKey::Age => "age",
            FieldKey::Sex => "sex",
            FieldKey::Bmi => "bmi",
            FieldKey::Bp => "bp",
            FieldKey::S1 => "s1",
            FieldKey::S2 => "s2",
            FieldKey::S3 => "s3",
            FieldKey::S4 => "s4",
            FieldKey::S5 => "s5",
            FieldKey::S6 => "s6",
        }
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Next field, wrapping around.
    pub fn next(self) -> FieldKey {
        FieldKey::ALL[(self.index() + 1) % FieldKey::ALL.len()]
    }

    /// Previous field, wrapping around.
    pub fn prev(self) -> FieldKey {
        let n = FieldKey::ALL.len();
        FieldKey::ALL[(self.index() + n - 1) % n]
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw, as-typed values for every field.
///
/// Values are never validated on write; an empty string means "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub age: String,
    pub sex: String,
    pub bmi: String,
    pub bp: String,
    pub s1: String,
    pub s2: String,
    pub s3: String,
    pub s4: String,
    pub s5: String,
    pub s6: String,
}

impl FormState {
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Age => &self.age,
            FieldKey::Sex => &self.sex,
            FieldKey::Bmi => &self.bmi,
            FieldKey::Bp => &self.bp,
            FieldKey::S1 => &self.s1,
            FieldKey::S2 => &self.s2,
            FieldKey::S3 => &self.s3,
            FieldKey::S4 => &self.s4,
            FieldKey::S5 => &self.s5,
            FieldKey::S6 => &self.s6,
        }
    }

    pub fn get_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::Age => &mut self.age,
            FieldKey::Sex => &mut self.sex,
            FieldKey::Bmi => &mut self.bmi,
            FieldKey::Bp => &mut self.bp,
            FieldKey::S1 => &mut self.s1,
            FieldKey::S2 => &mut self.s2,
            FieldKey::S3 => &mut self.s3,
            FieldKey::S4 => &mut self.s4,
            FieldKey::S5 => &mut self.s5,
            FieldKey::S6 => &mut self.s6,
        }
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.get_mut(key) = value.into();
    }

    /// Iterate `(key, raw value)` in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        FieldKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// True when no field holds any text.
    pub fn is_blank(&self) -> bool {
        self.iter().all(|(_, v)| v.is_empty())
    }
}

/// Validated numeric inputs, serialized as the prediction request body.
///
/// Field names match the wire keys exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub age: f64,
    pub sex: f64,
    pub bmi: f64,
    pub bp: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
    pub s6: f64,
}

impl FeatureVector {
    /// Build a vector by evaluating `f` for every field.
    pub fn from_fn(mut f: impl FnMut(FieldKey) -> f64) -> Self {
        Self {
            age: f(FieldKey::Age),
            sex: f(FieldKey::Sex),
            bmi: f(FieldKey::Bmi),
            bp: f(FieldKey::Bp),
            s1: f(FieldKey::S1),
            s2: f(FieldKey::S2),
            s3: f(FieldKey::S3),
            s4: f(FieldKey::S4),
            s5: f(FieldKey::S5),
            s6: f(FieldKey::S6),
        }
    }

    pub fn get(&self, key: FieldKey) -> f64 {
        match key {
            FieldKey::Age => self.age,
            FieldKey::Sex => self.sex,
            FieldKey::Bmi => self.bmi,
            FieldKey::Bp => self.bp,
            FieldKey::S1 => self.s1,
            FieldKey::S2 => self.s2,
            FieldKey::S3 => self.s3,
            FieldKey::S4 => self.s4,
            FieldKey::S5 => self.s5,
            FieldKey::S6 => self.s6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_order_matches_index_and_wire_names() {
        let names: Vec<&str> = FieldKey::ALL.iter().map(|k| k.wire_name()).collect();
        assert_eq!(names.join(" "), "age sex bmi bp s1 s2 s3 s4 s5 s6");
        for (i, key) in FieldKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn serde_names_match_wire_names() {
        for key in FieldKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.wire_name()));
        }
    }

    #[test]
    fn next_and_prev_wrap() {
        assert_eq!(FieldKey::S6.next(), FieldKey::Age);
        assert_eq!(FieldKey::Age.prev(), FieldKey::S6);
        assert_eq!(FieldKey::Bmi.next().prev(), FieldKey::Bmi);
    }

    #[test]
    fn form_state_set_and_get_each_slot() {
        let mut form = FormState::default();
        assert!(form.is_blank());
        for key in FieldKey::ALL {
            form.set(key, key.wire_name());
        }
        for key in FieldKey::ALL {
            assert_eq!(form.get(key), key.wire_name());
        }
        assert!(!form.is_blank());
    }

    #[test]
    fn feature_vector_serializes_exactly_ten_keys() {
        let v = FeatureVector::from_fn(|k| k.index() as f64);
        let value = serde_json::to_value(v).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 10);
        for key in FieldKey::ALL {
            assert_eq!(obj[key.wire_name()].as_f64(), Some(key.index() as f64));
        }
    }
}
