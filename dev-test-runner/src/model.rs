// Generated by json-shape. Edit the schema, not this file.

use json_shape::{DecodeError, EnumMapping, Value, array, enumerator, field, integer, nullable, optional, string};

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Pizza,
    Sandwich,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavouriteFood {
    pub r#type: Type,
    pub flavour: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub name: String,
    pub age: i64,
    pub favourite_numbers: Vec<i64>,
    pub favourite_colour: Option<String>,
    pub favourite_food: FavouriteFood,
    pub nickname: Option<String>,
}

fn type_mapping() -> EnumMapping<Type> {
    EnumMapping::new()
        .variant("pizza", Type::Pizza)
        .variant("sandwich", Type::Sandwich)
}

pub fn decode_favourite_food(value: &Value) -> Result<FavouriteFood, DecodeError> {
    Ok(FavouriteFood {
        r#type: field("type", enumerator(type_mapping()))(value)?,
        flavour: field("flavour", string)(value)?,
    })
}

pub fn decode_root(value: &Value) -> Result<Root, DecodeError> {
    Ok(Root {
        name: field("name", string)(value)?,
        age: field("age", integer)(value)?,
        favourite_numbers: field("favouriteNumbers", array(integer))(value)?,
        favourite_colour: field("favouriteColour", nullable(string))(value)?,
        favourite_food: field("favouriteFood", decode_favourite_food)(value)?,
        nickname: optional(field("nickname", string))(value)?,
    })
}
