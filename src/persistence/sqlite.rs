use super::{HistoryStore, PersistenceResult};
use crate::record::{Assignee, AssignmentRecord, WeekRecords};
use crate::week::WeekIndex;
use parking_lot::Mutex;
use rusqlite::{Connection, params};

pub struct SqliteHistory {
    connection: Mutex<Connection>,
}

impl SqliteHistory {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS assignments (
                year INTEGER NOT NULL,
                week INTEGER NOT NULL,
                chore_name TEXT NOT NULL,
                due TEXT NOT NULL,
                position INTEGER NOT NULL,
                assignee TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (year, week, chore_name, position)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistory {
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT chore_name, due, assignee, done FROM assignments
             WHERE year = ?1 AND week = ?2
             ORDER BY chore_name ASC, position ASC",
        )?;
        let rows = stmt.query_map(params![week.year(), week.week()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;

        let mut records = WeekRecords::new();
        for row in rows {
            let (chore_name, due, name, done) = row?;
            records
                .entry(chore_name.clone())
                .or_insert_with(|| AssignmentRecord {
                    chore_name,
                    due,
                    assignees: Vec::new(),
                })
                .assignees
                .push(Assignee { name, done });
        }
        Ok((!records.is_empty()).then_some(records))
    }

    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM assignments WHERE year = ?1 AND week = ?2 AND chore_name = ?3",
            params![week.year(), week.week(), record.chore_name],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assignments (year, week, chore_name, due, position, assignee, done)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, assignee) in record.assignees.iter().enumerate() {
                stmt.execute(params![
                    week.year(),
                    week.week(),
                    record.chore_name,
                    record.due,
                    position as i64,
                    assignee.name,
                    assignee.done,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize> {
        let conn = self.connection.lock();
        let removed = conn.query_row(
            "SELECT COUNT(*) FROM (
                SELECT DISTINCT year, week, chore_name FROM assignments
                WHERE year > ?1 OR (year = ?1 AND week >= ?2)
             )",
            params![week.year(), week.week()],
            |row| row.get::<_, i64>(0),
        )?;
        conn.execute(
            "DELETE FROM assignments WHERE year > ?1 OR (year = ?1 AND week >= ?2)",
            params![week.year(), week.week()],
        )?;
        Ok(removed as usize)
    }

    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT year, week FROM assignments ORDER BY year ASC, week ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, u32>(1)?)))?;
        let mut weeks = Vec::new();
        for row in rows {
            let (year, week) = row?;
            weeks.push(WeekIndex::new(week, year)?);
        }
        Ok(weeks)
    }
}
