use anyhow::{anyhow, Context, Error, Result};
use mutuals_client::User;
use prettytable::{cell, format, row, Row, Table};
use serde::Serialize;
use std::{
    fmt::Display,
    io::{self, Write},
    str::FromStr,
};

pub fn print_resources_as_json<Resource>(
    resources: impl IntoIterator<Item = Resource>,
    mut writer: impl Write,
) -> Result<usize>
where
    Resource: Serialize,
{
    let mut count = 0;
    for resource in resources {
        serde_json::to_writer(&mut writer, &resource)
            .context("Could not serialise resource.")
            .and_then(|_| writeln!(writer).context("Failed to write JSON resource to writer."))?;
        count += 1;
    }
    Ok(count)
}

/// Write one resource per line as it arrives.
pub fn print_resources_as_lines<Resource>(
    resources: impl IntoIterator<Item = Resource>,
    mut writer: impl Write,
) -> Result<usize>
where
    Resource: Display,
{
    let mut count = 0;
    for resource in resources {
        writeln!(writer, "{resource}").context("Failed to write resource to writer.")?;
        count += 1;
    }
    Ok(count)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("unknown output format: '{}'", string)),
        }
    }
}

/// Represents a resource that is able to be displayed as a table.
///
/// The implementation must implement `to_table_headers` to return headers for the resource type,
/// and `to_table_row`, which should return a data row for the given resource instance.
pub trait DisplayTable {
    fn to_table_headers() -> Row;

    fn to_table_row(&self) -> Row;
}

impl DisplayTable for User {
    fn to_table_headers() -> Row {
        row![bFg => "Screen Name", "ID"]
    }

    fn to_table_row(&self) -> Row {
        row![self.screen_name.0, self.id.0]
    }
}

/// Helper trait to allow collection of resources to be converted into a table.
pub trait IntoTable {
    fn into_table(self) -> Table;
}

/// All iterators of resources can be converted into a table.
impl<'a, Iterable, Item: 'a> IntoTable for Iterable
where
    Iterable: IntoIterator<Item = &'a Item>,
    Item: DisplayTable,
{
    fn into_table(self) -> Table {
        let mut table = new_table();
        table.set_titles(Item::to_table_headers());
        for resource in self.into_iter() {
            table.add_row(resource.to_table_row());
        }
        table
    }
}

pub fn new_table() -> Table {
    let mut table = Table::new();
    let format = format::FormatBuilder::new()
        .column_separator(' ')
        .borders(' ')
        .separators(&[], format::LineSeparator::new('-', '+', '+', '+'))
        .padding(0, 1)
        .build();
    table.set_format(format);
    table
}

/// Print resources using the selected output format.
#[derive(Default, Debug)]
pub struct Printer {
    output: OutputFormat,
}

impl Printer {
    pub fn new(output: OutputFormat) -> Self {
        Self { output }
    }

    /// Print a complete collection, as a table or as JSON lines.
    pub fn print_resources<T, Resource>(&self, resources: T) -> Result<()>
    where
        T: IntoIterator<Item = Resource> + IntoTable,
        Resource: Serialize,
    {
        match self.output {
            OutputFormat::Table => resources.into_table().printstd(),
            OutputFormat::Json => {
                print_resources_as_json(resources, io::stdout().lock())?;
            }
        };
        Ok(())
    }

    /// Print values as they are produced, one per line, returning how many were printed.
    ///
    /// A table cannot be laid out before its last row is known, so the table format prints
    /// bare values instead.
    pub fn print_stream<Resource>(
        &self,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<usize>
    where
        Resource: Serialize + Display,
    {
        let stdout = io::stdout();
        match self.output {
            OutputFormat::Table => print_resources_as_lines(resources, stdout.lock()),
            OutputFormat::Json => print_resources_as_json(resources, stdout.lock()),
        }
    }
}
