//! Delimited-text interchange for flat and derived tables.
//!
//! The header row is written from [`TableSchema::COLUMNS`], so an empty table
//! still carries its header. Fields are quoted only when they contain the
//! delimiter, a quote or a line break. Floats are written positionally via
//! [`plain_float`], never in exponent form.

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Serialize, Serializer, de::DeserializeOwned};

use crate::{
    app_error::{AppError, AppResult},
    models::TableSchema,
};

pub fn encode<T>(rows: &[T]) -> AppResult<Vec<u8>>
where
    T: TableSchema + Serialize,
{
    let tabular = |source| AppError::Tabular {
        table: T::NAME,
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(T::COLUMNS).map_err(tabular)?;
    for row in rows {
        writer.serialize(row).map_err(tabular)?;
    }

    writer
        .into_inner()
        .map_err(|err| tabular(err.into_error().into()))
}

/// Serializes a float in positional notation with at least one fractional
/// digit, so `1e16` becomes `10000000000000000.0` and `1e-7` becomes
/// `0.0000001`. Non-finite values keep the default rendering.
pub fn plain_float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return serializer.serialize_f64(*value);
    }

    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    serializer.serialize_str(&text)
}

/// Columns are matched by header name, not position.
pub fn decode<T>(bytes: &[u8]) -> AppResult<Vec<T>>
where
    T: TableSchema + DeserializeOwned,
{
    ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| AppError::Tabular {
            table: T::NAME,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartDetail, CartItem, Product, User, UserSummary};

    /// Header as serde derives it from the struct, to pin `COLUMNS` to it.
    fn serde_header<T: Serialize>(row: &T) -> String {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        text.lines().next().unwrap().to_string()
    }

    #[test]
    fn declared_columns_follow_field_order() {
        let summary = UserSummary {
            user_id: 1,
            first_name: "A".into(),
            total_spent: 1.0,
            total_items: 1,
            age: 1,
            city: "X".into(),
        };
        let detail = CartDetail {
            cart_id: 1,
            user_id: 1,
            product_id: 1,
            quantity: 1,
            price: 1.0,
            total_cart_value: 1.0,
            first_name: "A".into(),
            last_name: "B".into(),
            product_name: "P".into(),
            category: "c".into(),
            brand: "b".into(),
        };

        assert_eq!(serde_header(&summary), UserSummary::COLUMNS.join(","));
        assert_eq!(serde_header(&detail), CartDetail::COLUMNS.join(","));
    }

    #[test]
    fn empty_table_still_has_header() {
        let bytes = encode::<Product>(&[]).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "product_id,name,category,brand,price\n"
        );
    }

    #[test]
    fn numbers_are_encoded_textually() {
        let rows = [CartItem {
            cart_id: 10,
            user_id: 1,
            product_id: 5,
            quantity: 2,
            price: 20.0,
            total_cart_value: 45.0,
        }];

        let text = String::from_utf8(encode(&rows).unwrap()).unwrap();

        assert_eq!(
            text,
            "cart_id,user_id,product_id,quantity,price,total_cart_value\n10,1,5,2,20.0,45.0\n"
        );
    }

    #[test]
    fn extreme_floats_are_not_written_in_exponent_form() {
        let rows = [
            Product {
                product_id: 1,
                name: "Big".into(),
                category: "c".into(),
                brand: "b".into(),
                price: 1e16,
            },
            Product {
                product_id: 2,
                name: "Tiny".into(),
                category: "c".into(),
                brand: "b".into(),
                price: 1e-7,
            },
        ];

        let bytes = encode(&rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert_eq!(
            text,
            "product_id,name,category,brand,price\n\
             1,Big,c,b,10000000000000000.0\n\
             2,Tiny,c,b,0.0000001\n"
        );
        assert_eq!(decode::<Product>(&bytes).unwrap(), rows);
    }

    #[test]
    fn fields_containing_the_delimiter_are_quoted() {
        let rows = [User {
            user_id: 1,
            first_name: "A".into(),
            last_name: String::new(),
            gender: String::new(),
            age: 30,
            street: "1 St, 2".into(),
            city: "X".into(),
            postal_code: "00".into(),
        }];

        let bytes = encode(&rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert!(text.ends_with("1,A,,,30,\"1 St, 2\",X,00\n"), "{text}");
        assert_eq!(decode::<User>(&bytes).unwrap(), rows);
    }

    #[test]
    fn decode_reports_the_table_on_bad_input() {
        let err = decode::<Product>(b"product_id,name,category,brand,price\nabc,x,y,z,1.0\n")
            .unwrap_err();

        assert!(matches!(err, AppError::Tabular { table: "products_table", .. }));
    }
}
