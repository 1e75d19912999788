//! End-to-end harness for a checked-in generated model.
//!
//! `model.rs` is the output of
//! `json-shape rust --schema person.schema.json --root-type Root -o src/model.rs`
//! run from this directory. The binary decodes a few sample documents with it
//! and prints one line per outcome.

pub mod model;

use json_shape::Value;
use once_cell::sync::Lazy;
use serde_json::json;

static SAMPLES: Lazy<Vec<serde_json::Value>> = Lazy::new(|| {
    vec![
        json!({
            "name": "Bob",
            "age": 42,
            "favouriteNumbers": [1, 2, 3],
            "favouriteColour": null,
            "favouriteFood": { "type": "pizza", "flavour": "pepperoni" },
        }),
        // Mistyped element inside a nested array.
        json!({
            "name": "Bob",
            "age": 42,
            "favouriteNumbers": [1, 2, "3"],
            "favouriteColour": null,
            "favouriteFood": { "type": "pizza", "flavour": "pepperoni" },
        }),
        // Required field missing entirely.
        json!({
            "age": 42,
            "favouriteNumbers": [],
            "favouriteColour": "orange",
            "favouriteFood": { "type": "sandwich", "flavour": "cheese" },
        }),
    ]
});

fn main() {
    for (index, sample) in SAMPLES.iter().enumerate() {
        let value = Value::from(sample);
        match model::decode_root(&value) {
            Ok(root) => println!("sample {index}: ok: {root:?}"),
            Err(err) => println!("sample {index}: failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_model_decodes_the_conforming_sample() {
        let value = Value::from(&SAMPLES[0]);
        let root = model::decode_root(&value).unwrap();
        assert_eq!(root.name, "Bob");
        assert_eq!(root.age, 42);
        assert_eq!(root.favourite_numbers, vec![1, 2, 3]);
        assert_eq!(root.favourite_colour, None);
        assert_eq!(
            root.favourite_food,
            model::FavouriteFood {
                r#type: model::Type::Pizza,
                flavour: "pepperoni".to_string(),
            },
        );
        assert_eq!(root.nickname, None);
    }

    #[test]
    fn generated_model_names_the_failing_node() {
        let value = Value::from(&SAMPLES[1]);
        let err = model::decode_root(&value).unwrap_err();
        assert_eq!(err.path(), "favouriteNumbers[2]");
        assert_eq!(
            err.to_string(),
            "expected number, got \"3\"\n\tat index 2\n\tat field 'favouriteNumbers'",
        );
    }

    #[test]
    fn generated_model_insists_on_required_fields() {
        let value = Value::from(&SAMPLES[2]);
        let err = model::decode_root(&value).unwrap_err();
        assert_eq!(err.to_string(), "expected field 'name'");
    }

    #[test]
    fn generated_enum_rejects_tokens_outside_the_mapping() {
        let value = Value::from(&json!({
            "name": "Bob",
            "age": 42,
            "favouriteNumbers": [],
            "favouriteColour": null,
            "favouriteFood": { "type": "salad", "flavour": "green" },
        }));
        let err = model::decode_root(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected enum value, got \"salad\"\n\tat field 'type'\n\tat field 'favouriteFood'",
        );
    }
}
