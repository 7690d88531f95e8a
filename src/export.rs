use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::injuries::InjuryCounts;
use crate::roster::Player;
use crate::stat_value::StatValue;

pub const PLAYER_NAME_FIELD: &str = "playerName";
pub const INJURY_COUNT_FIELD: &str = "numTimesInjured";
pub const MISSING_TEXT: &str = "Unknown";
const MISSING_INTEGER: &str = "0";
const MISSING_FLOAT: &str = "0.0";
const OUTPUT_SUFFIX: &str = "_player_stats.csv";

/// One player's merged fields, in insertion order.
pub type Record = Vec<(String, StatValue)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Whole numbers in every row.
    Integer,
    /// Numbers with a fraction somewhere, or with gaps; printed as floats throughout.
    Float,
    Text,
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<String>>,
}

/// Stats first, then the injury count, then the name; one record per player.
pub fn build_records(players: &[Player], injuries: &InjuryCounts) -> Vec<Record> {
    players
        .iter()
        .map(|player| {
            let mut record = player.stats.clone();
            set_field(
                &mut record,
                INJURY_COUNT_FIELD,
                StatValue::Integer(i64::from(injuries.get(&player.full_name))),
            );
            set_field(
                &mut record,
                PLAYER_NAME_FIELD,
                StatValue::Text(player.full_name.clone()),
            );
            record
        })
        .collect()
}

fn set_field(record: &mut Record, key: &str, value: StatValue) {
    match record.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => record.push((key.to_string(), value)),
    }
}

pub fn normalize_column(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

pub fn output_path(dir: &Path, raw_team_input: &str) -> PathBuf {
    dir.join(format!("{raw_team_input}{OUTPUT_SUFFIX}"))
}

impl FeatureTable {
    pub fn from_records(records: &[Record]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for (key, _) in record {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }
        if let Some(pos) = names.iter().position(|n| *n == PLAYER_NAME_FIELD) {
            let name = names.remove(pos);
            names.insert(0, name);
        }

        let kinds: Vec<ColumnKind> = names
            .iter()
            .map(|name| column_kind(records, name))
            .collect();

        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                names
                    .iter()
                    .zip(&kinds)
                    .map(|(name, kind)| match (lookup(record, name), kind) {
                        (Some(value), ColumnKind::Float) => value.render_as_float(),
                        (Some(value), _) => value.render(),
                        (None, ColumnKind::Integer) => MISSING_INTEGER.to_string(),
                        (None, ColumnKind::Float) => MISSING_FLOAT.to_string(),
                        (None, ColumnKind::Text) => MISSING_TEXT.to_string(),
                    })
                    .collect::<Vec<String>>()
            })
            .collect();

        Self {
            columns: names.iter().map(|n| normalize_column(n)).collect(),
            kinds,
            rows,
        }
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns).context("write csv header")?;
        for row in &self.rows {
            out.write_record(row).context("write csv row")?;
        }
        out.flush().context("flush csv")?;
        Ok(())
    }

    /// Writes next to `path` first and renames, so a failure leaves no half-written file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create output dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("csv.tmp");
        let file = fs::File::create(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        let written = self.write_to(io::BufWriter::new(file)).and_then(|()| {
            fs::rename(&tmp, path).with_context(|| format!("move csv into {}", path.display()))
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        debug!(path = %path.display(), rows = self.rows.len(), "wrote csv");
        Ok(())
    }
}

fn lookup<'a>(record: &'a Record, name: &str) -> Option<&'a StatValue> {
    record
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_missing())
}

/// Numeric when every present value is a number; a column with nothing present is text.
/// A single gap or fractional value turns a number column into floats.
fn column_kind(records: &[Record], name: &str) -> ColumnKind {
    let present: Vec<&StatValue> = records.iter().filter_map(|r| lookup(r, name)).collect();
    if present.is_empty() || !present.iter().all(|v| v.is_numeric()) {
        return ColumnKind::Text;
    }
    let has_gap = present.len() < records.len();
    let has_fraction = present.iter().any(|v| matches!(v, StatValue::Number(_)));
    if has_gap || has_fraction {
        ColumnKind::Float
    } else {
        ColumnKind::Integer
    }
}
