/// Tables and their columns in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<(String, Vec<String>)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from `(table, column)` pairs. Names are trimmed and
    /// pairs with an empty table or column are skipped. Tables keep the
    /// order in which they first appear.
    pub fn from_pairs<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: AsRef<str>,
        C: AsRef<str>,
    {
        let mut schema = Self::new();
        for (table, column) in pairs {
            schema.add_column(table.as_ref(), column.as_ref());
        }
        schema
    }

    pub fn add_column(&mut self, table: &str, column: &str) {
        let (table, column) = (table.trim(), column.trim());
        if table.is_empty() || column.is_empty() {
            return;
        }
        match self.tables.iter_mut().find(|(name, _)| name == table) {
            Some((_, columns)) => columns.push(column.to_string()),
            None => self.tables.push((table.to_string(), vec![column.to_string()])),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.iter().find(|(name, _)| name == table).map(|(_, cols)| cols.as_slice())
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    /// One `table(col1, col2)` line per table, as shown to the model.
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|(table, columns)| format!("{}({})", table, columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
