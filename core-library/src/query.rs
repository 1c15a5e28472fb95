//! Predicate-based query compiler for song listings.
//!
//! A [`SongQuery`] is an ordered list of [`Predicate`]s plus a page. Compiling
//! it yields SQL with SQLite numbered parameters and the values to bind, so
//! parameter positions depend only on which filter fields are present.
//!
//! Predicates are appended in a fixed column order: id, group, title,
//! release date, text, link. Every query also excludes soft-deleted rows, and
//! the offset and limit are always the last two parameters.

use crate::models::{non_empty, SongFilter};
use crate::repositories::PageRequest;
use chrono::{DateTime, NaiveTime, Utc};

/// Columns of the `songs` table that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Group,
    Title,
    ReleaseDate,
    Text,
    Link,
}

impl Column {
    /// SQL identifier, quoted where it collides with a keyword.
    pub fn sql_name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Group => "\"group\"",
            Column::Title => "song",
            Column::ReleaseDate => "release_date",
            Column::Text => "text",
            Column::Link => "link",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact equality
    Eq,
    /// Case-sensitive substring containment; `%` and `_` are literal
    Contains,
}

/// A value bound to a numbered parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Timestamp(DateTime<Utc>),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: Column,
    pub operator: Operator,
    pub value: SqlParam,
}

impl Predicate {
    pub fn eq(column: Column, value: SqlParam) -> Self {
        Self {
            column,
            operator: Operator::Eq,
            value,
        }
    }

    pub fn contains(column: Column, needle: impl Into<String>) -> Self {
        Self {
            column,
            operator: Operator::Contains,
            value: SqlParam::Text(needle.into()),
        }
    }

    fn render(&self, position: usize) -> String {
        match self.operator {
            Operator::Eq => format!("{} = ?{}", self.column.sql_name(), position),
            Operator::Contains => format!("instr({}, ?{}) > 0", self.column.sql_name(), position),
        }
    }
}

/// SQL text plus the parameters in bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

const SELECT_SONGS: &str =
    "SELECT id, \"group\", song, release_date, text, link FROM songs WHERE deleted = 0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    predicates: Vec<Predicate>,
    page: PageRequest,
}

impl SongQuery {
    /// All live songs, paginated.
    pub fn new(page: PageRequest) -> Self {
        Self {
            predicates: Vec::new(),
            page,
        }
    }

    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Builds the predicate list from the constraining fields of `filter`.
    pub fn from_filter(filter: &SongFilter, page: PageRequest) -> Self {
        let mut query = Self::new(page);

        if let Some(id) = non_empty(&filter.id) {
            query = query.push(Predicate::eq(Column::Id, SqlParam::Text(id.to_string())));
        }
        if let Some(group) = non_empty(&filter.group) {
            query = query.push(Predicate::eq(
                Column::Group,
                SqlParam::Text(group.to_string()),
            ));
        }
        if let Some(title) = non_empty(&filter.title) {
            query = query.push(Predicate::eq(
                Column::Title,
                SqlParam::Text(title.to_string()),
            ));
        }
        if let Some(date) = filter.release_date {
            query = query.push(Predicate::eq(
                Column::ReleaseDate,
                SqlParam::Timestamp(date.and_time(NaiveTime::MIN).and_utc()),
            ));
        }
        if let Some(text) = non_empty(&filter.text) {
            query = query.push(Predicate::contains(Column::Text, text));
        }
        if let Some(link) = non_empty(&filter.link) {
            query = query.push(Predicate::eq(Column::Link, SqlParam::Text(link.to_string())));
        }

        query
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn compile(&self) -> CompiledQuery {
        let mut sql = String::from(SELECT_SONGS);
        let mut params = Vec::with_capacity(self.predicates.len() + 2);

        for (index, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(" AND ");
            sql.push_str(&predicate.render(index + 1));
            params.push(predicate.value.clone());
        }

        let offset_position = params.len() + 1;
        let limit_position = offset_position + 1;
        sql.push_str(&format!(
            " ORDER BY rowid LIMIT ?{} OFFSET ?{}",
            limit_position, offset_position
        ));

        params.push(SqlParam::Integer(to_sql_int(self.page.offset())));
        params.push(SqlParam::Integer(to_sql_int(self.page.limit())));

        CompiledQuery { sql, params }
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_filter_lists_live_songs() {
        let compiled = SongQuery::from_filter(&SongFilter::new(), PageRequest::new(1, 10)).compile();

        assert_eq!(
            compiled.sql,
            "SELECT id, \"group\", song, release_date, text, link FROM songs \
             WHERE deleted = 0 ORDER BY rowid LIMIT ?2 OFFSET ?1"
        );
        assert_eq!(
            compiled.params,
            vec![SqlParam::Integer(0), SqlParam::Integer(10)]
        );
    }

    #[test]
    fn test_predicates_follow_fixed_column_order() {
        let date = NaiveDate::from_ymd_opt(2006, 7, 16).unwrap();
        // Builder order differs from column order on purpose.
        let filter = SongFilter::new()
            .with_link("https://example.com")
            .with_text("love")
            .with_release_date(date)
            .with_title("Uprising")
            .with_group("Muse")
            .with_id("abc");

        let query = SongQuery::from_filter(&filter, PageRequest::new(3, 5));
        let columns: Vec<Column> = query.predicates().iter().map(|p| p.column).collect();
        assert_eq!(
            columns,
            vec![
                Column::Id,
                Column::Group,
                Column::Title,
                Column::ReleaseDate,
                Column::Text,
                Column::Link
            ]
        );

        let compiled = query.compile();
        assert!(compiled.sql.contains(
            "WHERE deleted = 0 AND id = ?1 AND \"group\" = ?2 AND song = ?3 \
             AND release_date = ?4 AND instr(text, ?5) > 0 AND link = ?6 \
             ORDER BY rowid LIMIT ?8 OFFSET ?7"
        ));
        assert_eq!(compiled.params.len(), 8);
        assert_eq!(compiled.params[6], SqlParam::Integer(10));
        assert_eq!(compiled.params[7], SqlParam::Integer(5));
        assert_eq!(
            compiled.params[3],
            SqlParam::Timestamp(date.and_time(NaiveTime::MIN).and_utc())
        );
    }

    #[test]
    fn test_positions_are_dense_for_sparse_filters() {
        let filter = SongFilter::new().with_group("Muse").with_text("");
        let compiled = SongQuery::from_filter(&filter, PageRequest::new(2, 10)).compile();

        assert!(compiled
            .sql
            .ends_with("AND \"group\" = ?1 ORDER BY rowid LIMIT ?3 OFFSET ?2"));
        assert_eq!(
            compiled.params,
            vec![
                SqlParam::Text("Muse".to_string()),
                SqlParam::Integer(10),
                SqlParam::Integer(10)
            ]
        );
    }

    #[test]
    fn test_text_uses_containment() {
        let filter = SongFilter::new().with_text("50%_off");
        let query = SongQuery::from_filter(&filter, PageRequest::default());

        assert_eq!(query.predicates()[0].operator, Operator::Contains);
        assert_eq!(
            query.predicates()[0].value,
            SqlParam::Text("50%_off".to_string())
        );
        assert!(query.compile().sql.contains("instr(text, ?1) > 0"));
    }
}
