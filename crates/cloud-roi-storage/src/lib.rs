use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use cloud_roi_core::{CalculationResults, InputValues};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One saved calculation: the inputs a user entered, the results shown for
/// them, and when they were captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoiRecord {
    pub id: String,
    pub company_name: String,
    pub inputs: InputValues,
    pub outputs: CalculationResults,
    pub timestamp: DateTime<Utc>,
    /// Server-side write time; orders records for `latest` and `list`.
    pub updated_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NewRoiRecord {
    pub inputs: InputValues,
    pub outputs: CalculationResults,
    /// Capture time reported by the caller. Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

pub trait StorageBackend: Send {
    /// Inserts or replaces the record keyed by the normalized company name.
    fn upsert(&mut self, new_record: NewRoiRecord) -> Result<RoiRecord, StorageError>;
    fn latest(&self) -> Option<RoiRecord>;
    fn get(&self, company_name: &str) -> Result<Option<RoiRecord>, StorageError>;
    fn delete_by_key(&mut self, company_name: &str) -> Result<bool, StorageError>;
    fn list(&self, limit: usize) -> Vec<RoiRecord>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Storage key for a company name: lowercased, every whitespace run replaced
/// by a single `-`. Leading and trailing runs are kept, so `" Acme"` and
/// `"Acme"` are different keys.
pub fn normalize_key(company_name: &str) -> Result<String, StorageError> {
    if company_name.trim().is_empty() {
        return Err(StorageError::InvalidInput(
            "companyName cannot be empty".to_string(),
        ));
    }

    let mut key = String::with_capacity(company_name.len());
    let mut in_whitespace = false;
    for ch in company_name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                key.push('-');
            }
            in_whitespace = true;
        } else {
            key.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    Ok(key)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    records: Vec<RoiRecord>,
}

/// Records ordered oldest write first. Shared by both backends.
#[derive(Debug, Default, Clone)]
struct RecordSet {
    records: Vec<RoiRecord>,
}

impl RecordSet {
    fn upsert(&mut self, new_record: NewRoiRecord) -> Result<RoiRecord, StorageError> {
        let id = normalize_key(&new_record.inputs.company_name)?;
        ensure_finite(&new_record.inputs, &new_record.outputs)?;

        let last_ms = self.records.last().map_or(0, |r| r.updated_ms);
        let record = RoiRecord {
            id,
            company_name: new_record.inputs.company_name.clone(),
            inputs: new_record.inputs,
            outputs: new_record.outputs,
            timestamp: new_record.timestamp.unwrap_or_else(Utc::now),
            updated_ms: now_ms().max(last_ms),
        };

        let replaced = self.records.iter().any(|r| r.id == record.id);
        self.records.retain(|r| r.id != record.id);
        self.records.push(record.clone());
        tracing::debug!(id = %record.id, replaced, "record upserted");
        Ok(record)
    }

    fn latest(&self) -> Option<RoiRecord> {
        self.records.last().cloned()
    }

    fn get(&self, company_name: &str) -> Result<Option<RoiRecord>, StorageError> {
        let key = normalize_key(company_name)?;
        Ok(self.records.iter().find(|r| r.id == key).cloned())
    }

    fn delete(&mut self, company_name: &str) -> Result<bool, StorageError> {
        let key = normalize_key(company_name)?;
        let before = self.records.len();
        self.records.retain(|r| r.id != key);
        Ok(self.records.len() != before)
    }

    fn list(&self, limit: usize) -> Vec<RoiRecord> {
        let n = limit.max(1);
        self.records.iter().rev().take(n).cloned().collect()
    }
}

/// JSON-file backed store. The whole file is rewritten after every change.
pub struct PersistentRecordStore {
    path: PathBuf,
    set: RecordSet,
}

impl PersistentRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let persisted = Persisted::default();
            let bytes = serde_json::to_vec_pretty(&persisted)?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let mut persisted: Persisted = serde_json::from_slice(&bytes)?;
        persisted.records.sort_by_key(|r| r.updated_ms);
        tracing::info!(
            path = %path.display(),
            records = persisted.records.len(),
            "record store opened"
        );

        Ok(Self {
            path,
            set: RecordSet {
                records: persisted.records,
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `staged` to disk and adopts it only once the write succeeded.
    fn commit(&mut self, staged: RecordSet) -> Result<(), StorageError> {
        let persisted = Persisted {
            records: staged.records,
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        fs::write(&self.path, bytes)?;
        self.set.records = persisted.records;
        Ok(())
    }
}

impl StorageBackend for PersistentRecordStore {
    fn upsert(&mut self, new_record: NewRoiRecord) -> Result<RoiRecord, StorageError> {
        let mut staged = self.set.clone();
        let record = staged.upsert(new_record)?;
        self.commit(staged)?;
        Ok(record)
    }

    fn latest(&self) -> Option<RoiRecord> {
        self.set.latest()
    }

    fn get(&self, company_name: &str) -> Result<Option<RoiRecord>, StorageError> {
        self.set.get(company_name)
    }

    fn delete_by_key(&mut self, company_name: &str) -> Result<bool, StorageError> {
        let mut staged = self.set.clone();
        let changed = staged.delete(company_name)?;
        if changed {
            self.commit(staged)?;
        }
        Ok(changed)
    }

    fn list(&self, limit: usize) -> Vec<RoiRecord> {
        self.set.list(limit)
    }

    fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "backend": "json",
            "count": self.set.records.len(),
            "path": self.path,
        })
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    set: RecordSet,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryRecordStore {
    fn upsert(&mut self, new_record: NewRoiRecord) -> Result<RoiRecord, StorageError> {
        self.set.upsert(new_record)
    }

    fn latest(&self) -> Option<RoiRecord> {
        self.set.latest()
    }

    fn get(&self, company_name: &str) -> Result<Option<RoiRecord>, StorageError> {
        self.set.get(company_name)
    }

    fn delete_by_key(&mut self, company_name: &str) -> Result<bool, StorageError> {
        self.set.delete(company_name)
    }

    fn list(&self, limit: usize) -> Vec<RoiRecord> {
        self.set.list(limit)
    }

    fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "backend": "memory",
            "count": self.set.records.len(),
        })
    }
}

/// JSON has no representation for NaN or infinity; a record holding one
/// would be written as `null` and could never be read back.
fn ensure_finite(inputs: &InputValues, outputs: &CalculationResults) -> Result<(), StorageError> {
    let input_fields = [
        ("revenuePerYear", inputs.revenue_per_year),
        ("cloudSpendPerYear", inputs.cloud_spend_per_year),
        ("engineerCostPerYear", inputs.engineer_cost_per_year),
        ("cloudUsageHours", inputs.cloud_usage_hours),
        ("serviceModel.saas", inputs.service_model.saas),
        ("serviceModel.paas", inputs.service_model.paas),
        ("serviceModel.iaas", inputs.service_model.iaas),
        ("timeOnOps", inputs.time_on_ops),
        ("manualToil", inputs.manual_toil),
        ("containerWorkloads", inputs.container_workloads),
        ("computeSpend", inputs.compute_spend),
        ("costSensitiveWorkloads", inputs.cost_sensitive_workloads),
        ("grossMargin", inputs.gross_margin),
        ("vmUtilization", inputs.vm_utilization),
        ("responseTime", inputs.response_time),
        ("failureRate", inputs.failure_rate),
        ("costOfFailure", inputs.cost_of_failure),
    ];
    let output_fields = [
        ("productivityGain", outputs.productivity_gain),
        ("costSavings", outputs.cost_savings),
        ("performanceGain", outputs.performance_gain),
        ("availabilityGain", outputs.availability_gain),
        ("totalROI", outputs.total_roi),
        ("roiPercentage", outputs.roi_percentage),
        ("monthlyGains", outputs.monthly_gains),
        ("scores.productivity", outputs.scores.productivity),
        ("scores.costSavings", outputs.scores.cost_savings),
        ("scores.performance", outputs.scores.performance),
        ("scores.availability", outputs.scores.availability),
    ];

    let bad = input_fields
        .iter()
        .chain(output_fields.iter())
        .find(|(_, v)| !v.is_finite());
    match bad {
        Some((field, value)) => Err(StorageError::InvalidInput(format!(
            "{field} is {value}; only finite numbers can be stored"
        ))),
        None => Ok(()),
    }
}

pub fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(now.as_millis()).unwrap_or(u64::MAX)
}
