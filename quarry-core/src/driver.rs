use crate::{
    Connection, DeleteCommandBuilder, InsertCommandBuilder, SelectCommandBuilder, TypeMapping,
    UpdateCommandBuilder, writer::SqlWriter,
};

/// Entry point of a database backend: its connection type and its SQL dialect.
pub trait Driver: Default + Send + Sync + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;

    /// Scheme of the connection strings accepted by this driver.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    fn select_command_builder(&self, mapping: &TypeMapping) -> SelectCommandBuilder {
        SelectCommandBuilder::new(mapping)
    }
    fn insert_command_builder(&self) -> InsertCommandBuilder {
        InsertCommandBuilder::new()
    }
    fn update_command_builder(&self) -> UpdateCommandBuilder {
        UpdateCommandBuilder::new()
    }
    fn delete_command_builder(&self) -> DeleteCommandBuilder {
        DeleteCommandBuilder::new()
    }
}
