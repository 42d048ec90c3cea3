//! Style guides and their before/after examples

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json};
use super::super::Database;
use crate::models::{
    StyleGuide, StyleGuideExample, StyleGuideInput, StyleGuideSummary, StyleGuideWithExamples,
};

const GUIDE_COLUMNS: &str =
    "id, name, description, characteristics, tone, language, is_default, created_at, updated_at";
const EXAMPLE_COLUMNS: &str = "id, style_guide_id, \"before\", \"after\", created_at";

impl Database {
    fn row_to_style_guide(row: &Row<'_>) -> SqliteResult<StyleGuide> {
        Ok(StyleGuide {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            characteristics: json_at(row, 3)?,
            tone: row.get(4)?,
            language: row.get(5)?,
            is_default: row.get(6)?,
            created_at: timestamp_at(row, 7)?,
            updated_at: timestamp_at(row, 8)?,
        })
    }

    fn row_to_example(row: &Row<'_>) -> SqliteResult<StyleGuideExample> {
        Ok(StyleGuideExample {
            id: row.get(0)?,
            style_guide_id: row.get(1)?,
            before: row.get(2)?,
            after: row.get(3)?,
            created_at: timestamp_at(row, 4)?,
        })
    }

    fn query_style_guide(conn: &Connection, id: &str) -> SqliteResult<Option<StyleGuide>> {
        conn.query_row(
            &format!("SELECT {} FROM style_guides WHERE id = ?1", GUIDE_COLUMNS),
            [id],
            Self::row_to_style_guide,
        )
        .optional()
    }

    fn query_examples(conn: &Connection, guide_id: &str) -> SqliteResult<Vec<StyleGuideExample>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM style_guide_examples WHERE style_guide_id = ?1 ORDER BY created_at, rowid",
            EXAMPLE_COLUMNS
        ))?;
        let examples = stmt
            .query_map([guide_id], Self::row_to_example)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(examples)
    }

    fn query_example(conn: &Connection, id: &str) -> SqliteResult<Option<StyleGuideExample>> {
        conn.query_row(
            &format!("SELECT {} FROM style_guide_examples WHERE id = ?1", EXAMPLE_COLUMNS),
            [id],
            Self::row_to_example,
        )
        .optional()
    }

    fn with_examples(conn: &Connection, guide: StyleGuide) -> SqliteResult<StyleGuideWithExamples> {
        let examples = Self::query_examples(conn, &guide.id)?;
        Ok(StyleGuideWithExamples { guide, examples })
    }

    /// Public listing: default first, then by name
    pub fn list_style_guide_summaries(&self) -> SqliteResult<Vec<StyleGuideSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_default FROM style_guides ORDER BY is_default DESC, name",
        )?;
        let guides = stmt
            .query_map([], |row| {
                Ok(StyleGuideSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_default: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(guides)
    }

    /// Admin listing: default first, then oldest first
    pub fn list_style_guides(&self) -> SqliteResult<Vec<StyleGuideWithExamples>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM style_guides ORDER BY is_default DESC, created_at, rowid",
            GUIDE_COLUMNS
        ))?;
        let guides = stmt
            .query_map([], Self::row_to_style_guide)?
            .collect::<SqliteResult<Vec<_>>>()?;
        guides
            .into_iter()
            .map(|guide| Self::with_examples(&conn, guide))
            .collect()
    }

    pub fn get_style_guide(&self, id: &str) -> SqliteResult<Option<StyleGuideWithExamples>> {
        let conn = self.conn.lock();
        Self::query_style_guide(&conn, id)?
            .map(|guide| Self::with_examples(&conn, guide))
            .transpose()
    }

    pub fn get_default_style_guide(&self) -> SqliteResult<Option<StyleGuideWithExamples>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {} FROM style_guides WHERE is_default = 1 ORDER BY updated_at DESC LIMIT 1",
                GUIDE_COLUMNS
            ),
            [],
            Self::row_to_style_guide,
        )
        .optional()?
        .map(|guide| Self::with_examples(&conn, guide))
        .transpose()
    }

    pub fn count_style_guides(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM style_guides", [], |row| row.get(0))
    }

    /// Required fields must already be validated; initial examples are inserted in order
    pub fn create_style_guide(&self, input: &StyleGuideInput) -> SqliteResult<StyleGuideWithExamples> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let is_default = input.is_default.unwrap_or(false);
        if is_default {
            tx.execute("UPDATE style_guides SET is_default = 0 WHERE is_default = 1", [])?;
        }

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO style_guides (id, name, description, characteristics, tone, language, is_default, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                input.name.as_deref().unwrap_or_default(),
                input.description.as_deref().unwrap_or_default(),
                to_json(input.characteristics.as_deref().unwrap_or_default()),
                input.tone.as_deref().unwrap_or_default(),
                input.language.as_deref().unwrap_or("vi"),
                is_default,
                now_rfc3339(),
            ],
        )?;

        for example in input.examples.iter().flatten() {
            let before = example.before.as_deref().map(str::trim).unwrap_or_default();
            let after = example.after.as_deref().map(str::trim).unwrap_or_default();
            if before.is_empty() || after.is_empty() {
                continue;
            }
            Self::insert_example(&tx, &id, before, after)?;
        }

        let guide = Self::query_style_guide(&tx, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let created = Self::with_examples(&tx, guide)?;
        tx.commit()?;
        Ok(created)
    }

    /// Partial update; `None` when the id does not exist
    pub fn update_style_guide(
        &self,
        id: &str,
        input: &StyleGuideInput,
    ) -> SqliteResult<Option<StyleGuideWithExamples>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(current) = Self::query_style_guide(&tx, id)? else {
            return Ok(None);
        };

        let is_default = input.is_default.unwrap_or(current.is_default);
        if is_default {
            tx.execute("UPDATE style_guides SET is_default = 0 WHERE id != ?1", [id])?;
        }

        tx.execute(
            "UPDATE style_guides SET name = ?1, description = ?2, characteristics = ?3, tone = ?4, language = ?5,
             is_default = ?6, updated_at = ?7 WHERE id = ?8",
            params![
                input.name.as_ref().unwrap_or(&current.name),
                input.description.as_ref().unwrap_or(&current.description),
                to_json(input.characteristics.as_ref().unwrap_or(&current.characteristics)),
                input.tone.as_ref().unwrap_or(&current.tone),
                input.language.as_ref().unwrap_or(&current.language),
                is_default,
                now_rfc3339(),
                id,
            ],
        )?;

        let guide = Self::query_style_guide(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let updated = Self::with_examples(&tx, guide)?;
        tx.commit()?;
        Ok(Some(updated))
    }

    pub fn delete_style_guide(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM style_guides WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    fn insert_example(
        conn: &Connection,
        guide_id: &str,
        before: &str,
        after: &str,
    ) -> SqliteResult<StyleGuideExample> {
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO style_guide_examples (id, style_guide_id, \"before\", \"after\", created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, guide_id, before, after, now_rfc3339()],
        )?;
        Self::query_example(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn add_style_guide_example(
        &self,
        guide_id: &str,
        before: &str,
        after: &str,
    ) -> SqliteResult<StyleGuideExample> {
        let conn = self.conn.lock();
        Self::insert_example(&conn, guide_id, before, after)
    }

    /// An example, only when it belongs to `guide_id`
    pub fn get_style_guide_example(
        &self,
        guide_id: &str,
        example_id: &str,
    ) -> SqliteResult<Option<StyleGuideExample>> {
        let conn = self.conn.lock();
        Ok(Self::query_example(&conn, example_id)?.filter(|e| e.style_guide_id == guide_id))
    }

    pub fn update_style_guide_example(
        &self,
        example_id: &str,
        before: Option<&str>,
        after: Option<&str>,
    ) -> SqliteResult<Option<StyleGuideExample>> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE style_guide_examples SET \"before\" = COALESCE(?1, \"before\"), \"after\" = COALESCE(?2, \"after\") WHERE id = ?3",
            params![before, after, example_id],
        )?;
        Self::query_example(&conn, example_id)
    }

    pub fn delete_style_guide_example(&self, example_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected =
            conn.execute("DELETE FROM style_guide_examples WHERE id = ?1", [example_id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExampleInput;

    fn guide_input(name: &str, is_default: bool) -> StyleGuideInput {
        StyleGuideInput {
            name: Some(name.to_string()),
            description: Some("Mô tả".to_string()),
            characteristics: Some(vec!["Ngắn gọn".to_string(), "Rõ ràng".to_string()]),
            tone: Some("Thân thiện".to_string()),
            language: Some("vi".to_string()),
            is_default: Some(is_default),
            examples: None,
        }
    }

    #[test]
    fn test_single_default_guide() {
        let db = Database::in_memory().unwrap();
        let first = db.create_style_guide(&guide_input("B first", true)).unwrap();
        let second = db.create_style_guide(&guide_input("A second", true)).unwrap();

        let guides = db.list_style_guides().unwrap();
        assert_eq!(guides.iter().filter(|g| g.guide.is_default).count(), 1);
        assert_eq!(guides[0].guide.id, second.guide.id);

        let patch = StyleGuideInput {
            is_default: Some(true),
            ..Default::default()
        };
        db.update_style_guide(&first.guide.id, &patch).unwrap().unwrap();
        let default = db.get_default_style_guide().unwrap().unwrap();
        assert_eq!(default.guide.id, first.guide.id);

        let summaries = db.list_style_guide_summaries().unwrap();
        assert_eq!(summaries[0].id, first.guide.id);
        assert!(!summaries[1].is_default);
    }

    #[test]
    fn test_examples_belong_to_guide() {
        let db = Database::in_memory().unwrap();
        let mut input = guide_input("Guide", false);
        input.examples = Some(vec![
            ExampleInput {
                before: Some(" trước ".to_string()),
                after: Some(" sau ".to_string()),
            },
            ExampleInput {
                before: Some("incomplete".to_string()),
                after: None,
            },
        ]);
        let guide = db.create_style_guide(&input).unwrap();
        assert_eq!(guide.examples.len(), 1);
        assert_eq!(guide.examples[0].before, "trước");

        let other = db.create_style_guide(&guide_input("Other", false)).unwrap();
        let example_id = &guide.examples[0].id;
        assert!(db.get_style_guide_example(&other.guide.id, example_id).unwrap().is_none());

        let updated = db
            .update_style_guide_example(example_id, None, Some("sau khi sửa"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.before, "trước");
        assert_eq!(updated.after, "sau khi sửa");

        db.delete_style_guide(&guide.guide.id).unwrap();
        assert!(db.get_style_guide_example(&guide.guide.id, example_id).unwrap().is_none());
    }
}
