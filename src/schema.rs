use sqlx::PgPool;

const STATEMENTS: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS students (
        id SERIAL PRIMARY KEY,
        student_id VARCHAR(20) NOT NULL UNIQUE,
        name VARCHAR(100) NOT NULL,
        father_name VARCHAR(100) NOT NULL,
        mother_name VARCHAR(100) NOT NULL,
        student_class INTEGER NOT NULL,
        section VARCHAR(10) NOT NULL DEFAULT 'A',
        date_of_birth DATE NOT NULL,
        contact_number VARCHAR(15),
        address TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS attendance (
        id SERIAL PRIMARY KEY,
        student INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        date DATE NOT NULL,
        is_present BOOLEAN NOT NULL DEFAULT FALSE,
        UNIQUE (student, date)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS class_sequences (
        student_class INTEGER PRIMARY KEY,
        last_value INTEGER NOT NULL
    )"#,
];

/// Creates the tables when they are missing. Existing tables are left as is.
pub async fn prepare(pg: &PgPool) -> anyhow::Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pg).await?;
    }
    log::info!("Database schema ready");
    Ok(())
}
