mod result_set;
mod row;
mod value;

pub use result_set::{ResultCursor, ResultSet};
pub use row::Row;
pub use value::{ColumnIndex, FromSqlValue};

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::error::NamedSqlError;
    use crate::types::SqlValue;

    fn sample() -> ResultSet {
        let mut rs = ResultSet::with_columns(vec!["id".into(), "name".into(), "seen".into()], 2);
        rs.add_row_values(vec![
            SqlValue::Int(1),
            SqlValue::Text("alice".into()),
            SqlValue::Text("2024-03-01 10:20:30.456".into()),
        ]);
        rs.add_row_values(vec![SqlValue::Int(2), SqlValue::Null, SqlValue::Null]);
        rs
    }

    #[test]
    fn rows_share_columns_and_lookup_by_name() {
        let rs = sample();
        assert_eq!(rs.len(), 2);
        let first = &rs.rows()[0];
        assert_eq!(first.column_names(), rs.column_names());
        assert_eq!(first.get("name"), Some(&SqlValue::Text("alice".into())));
        assert_eq!(first.get_by_index(0), Some(&SqlValue::Int(1)));
        assert_eq!(first.get("missing"), None);
    }

    #[test]
    fn typed_reads_convert_and_parse_timestamps() {
        let rs = sample();
        let first = &rs.rows()[0];
        let seen: NaiveDateTime = first.try_get("seen").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_milli_opt(10, 20, 30, 456))
            .unwrap();
        assert_eq!(seen, expected);

        let second = &rs.rows()[1];
        let name: Option<String> = second.try_get("name").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn mapping_failures_are_classified() {
        let rs = sample();
        let second = &rs.rows()[1];
        let err = second.try_get::<String>("name").unwrap_err();
        assert!(err.is_mapping_error());
        let err = second.try_get::<i64>("nope").unwrap_err();
        assert!(matches!(err, NamedSqlError::MappingError(msg) if msg.contains("nope")));
        assert!(second.try_get::<i64>(9_usize).is_err());
    }

    #[test]
    fn cursor_tracks_consumption() {
        let mut cursor = sample().into_cursor();
        assert_eq!(cursor.remaining(), 2);
        let row = cursor.next().unwrap();
        assert_eq!(row.try_get::<i64>(0_usize).unwrap(), 1);
        assert_eq!(cursor.position(), 1);
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn extend_concatenates_in_order() {
        let mut all = ResultSet::default();
        all.extend(sample());
        all.extend(sample());
        let ids: Vec<i64> = all
            .rows()
            .iter()
            .map(|r| r.try_get("id").unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 1, 2]);
    }

    #[test]
    fn decimals_read_as_text_float_or_whole_integer() {
        let mut rs = ResultSet::with_columns(vec!["total".into(), "price".into()], 1);
        rs.add_row_values(vec![SqlValue::decimal("6"), SqlValue::decimal("12.50")]);
        let row = &rs.rows()[0];
        assert_eq!(row.try_get::<i64>("total").unwrap(), 6);
        assert_eq!(row.try_get::<String>("price").unwrap(), "12.50");
        assert!((row.try_get::<f64>("price").unwrap() - 12.5).abs() < f64::EPSILON);
        let err = row.try_get::<i64>("price").unwrap_err();
        assert!(err.is_mapping_error());
    }
}
