use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Deserialize;

use crate::data::records::{
    ShapedElement, TableRow, NODE_FIELDS, NODE_TAGS_FIELDS, WAY_FIELDS, WAY_NODES_FIELDS, WAY_TAGS_FIELDS,
};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Nodes,
    NodeTags,
    Ways,
    WayNodes,
    WayTags,
}

impl Table {
    pub const ALL: [Table; 5] = [Table::Nodes, Table::NodeTags, Table::Ways, Table::WayNodes, Table::WayTags];

    pub fn file_name(self) -> &'static str {
        match self {
            Table::Nodes => "nodes.csv",
            Table::NodeTags => "nodes_tags.csv",
            Table::Ways => "ways.csv",
            Table::WayNodes => "ways_nodes.csv",
            Table::WayTags => "ways_tags.csv",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            Table::Nodes => &NODE_FIELDS,
            Table::NodeTags => &NODE_TAGS_FIELDS,
            Table::Ways => &WAY_FIELDS,
            Table::WayNodes => &WAY_NODES_FIELDS,
            Table::WayTags => &WAY_TAGS_FIELDS,
        }
    }

    pub fn path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Byte encoding applied to every value before it is written.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    /// ISO-8859-1. Characters outside of it are written as `?`.
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

impl OutputEncoding {
    pub fn encode<'a>(&self, value: &'a str) -> Cow<'a, [u8]> {
        match self {
            OutputEncoding::Utf8 => Cow::Borrowed(value.as_bytes()),
            OutputEncoding::Latin1 if value.is_ascii() => Cow::Borrowed(value.as_bytes()),
            OutputEncoding::Latin1 => Cow::Owned(
                value.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect()
            ),
        }
    }
}

pub struct TableWriter {
    writer: Writer<File>,
    encoding: OutputEncoding,
    rows: u64,
}

impl TableWriter {
    pub fn create(dir: &Path, table: Table, encoding: OutputEncoding) -> Result<TableWriter> {
        let mut writer = Writer::from_path(table.path(dir))?;
        writer.write_record(table.header())?;
        Ok(TableWriter {
            writer,
            encoding,
            rows: 0,
        })
    }

    pub fn write_row<T: TableRow>(&mut self, row: &T) -> Result<()> {
        let encoding = self.encoding;
        let fields = row.fields();
        self.writer.write_record(fields.iter().map(|field| encoding.encode(field)))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_rows<T: TableRow>(&mut self, rows: &[T]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// The five output tables of a conversion run.
pub struct OutputTables {
    nodes: TableWriter,
    node_tags: TableWriter,
    ways: TableWriter,
    way_nodes: TableWriter,
    way_tags: TableWriter,
}

impl OutputTables {
    pub fn create(dir: &Path, encoding: OutputEncoding) -> Result<OutputTables> {
        Ok(OutputTables {
            nodes: TableWriter::create(dir, Table::Nodes, encoding)?,
            node_tags: TableWriter::create(dir, Table::NodeTags, encoding)?,
            ways: TableWriter::create(dir, Table::Ways, encoding)?,
            way_nodes: TableWriter::create(dir, Table::WayNodes, encoding)?,
            way_tags: TableWriter::create(dir, Table::WayTags, encoding)?,
        })
    }

    pub fn write(&mut self, shaped: &ShapedElement) -> Result<()> {
        match shaped {
            ShapedElement::Node(node) => {
                self.nodes.write_row(&node.node)?;
                self.node_tags.write_rows(&node.node_tags)?;
            }
            ShapedElement::Way(way) => {
                self.ways.write_row(&way.way)?;
                self.way_nodes.write_rows(&way.way_nodes)?;
                self.way_tags.write_rows(&way.way_tags)?;
            }
        }
        Ok(())
    }

    pub fn rows(&self, table: Table) -> u64 {
        match table {
            Table::Nodes => self.nodes.rows(),
            Table::NodeTags => self.node_tags.rows(),
            Table::Ways => self.ways.rows(),
            Table::WayNodes => self.way_nodes.rows(),
            Table::WayTags => self.way_tags.rows(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()
    }
}
