use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use cloud_roi_advisor::{
    AdvisoryProvider, AdvisoryRequest, ChatMessage, FALLBACK_ADVICE, ProviderError,
    build_advisory_provider, greeting,
};
use cloud_roi_core::{
    CalculationResults, InputValues, ValidationReport, compute, summary_line, validate_inputs,
};
use cloud_roi_storage::{
    InMemoryRecordStore, NewRoiRecord, PersistentRecordStore, RoiRecord, StorageBackend,
    StorageError, normalize_key,
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::{BackendKind, ServerConfig};
use crate::protocol::{
    ADVISORY_UNAVAILABLE, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, STORAGE_ERROR,
};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("advisory provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

struct Advisor {
    provider: Arc<dyn AdvisoryProvider>,
    runtime: tokio::runtime::Runtime,
}

/// Tool server over one record store and an optional advisory provider.
///
/// Every transport funnels into [`RoiServer::handle_request`] or the shared
/// record operations below, so JSON-RPC and REST callers see the same data.
pub struct RoiServer {
    store: Arc<Mutex<Box<dyn StorageBackend>>>,
    advisor: Option<Advisor>,
    strict_inputs: bool,
    secrets: Vec<String>,
}

/// A failed operation, carrying both its JSON-RPC code and HTTP status.
#[derive(Debug)]
pub(crate) struct Failure {
    pub code: i64,
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
}

impl Failure {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            status: 400,
            message: message.into(),
            data: None,
        }
    }

    fn rejected_inputs(report: &ValidationReport) -> Self {
        let fields = report.errors().map(|i| i.field).collect::<Vec<_>>();
        Self {
            code: INVALID_PARAMS,
            status: 422,
            message: format!("inputs failed validation: {}", fields.join(", ")),
            data: Some(json!({ "validation": report })),
        }
    }

    fn lock() -> Self {
        Self {
            code: INTERNAL_ERROR,
            status: 500,
            message: "storage lock poisoned".to_string(),
            data: None,
        }
    }

    fn advisory_unavailable() -> Self {
        Self {
            code: ADVISORY_UNAVAILABLE,
            status: 503,
            message: "advisory provider is not configured".to_string(),
            data: None,
        }
    }

    fn into_response(self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::error_with_data(id, self.code, self.message, self.data)
    }
}

impl From<StorageError> for Failure {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(msg) => Self::invalid_params(msg),
            other => {
                tracing::error!(error = %other, "storage operation failed");
                Self {
                    code: STORAGE_ERROR,
                    status: 500,
                    message: other.to_string(),
                    data: None,
                }
            }
        }
    }
}

impl RoiServer {
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, ServerError> {
        let store: Box<dyn StorageBackend> = match cfg.backend {
            BackendKind::Json => Box::new(PersistentRecordStore::open(&cfg.db_path)?),
            BackendKind::Memory => Box::new(InMemoryRecordStore::new()),
        };
        let mut server = Self::with_backend(store).with_strict_inputs(cfg.strict_inputs);
        server.secrets = cfg.secrets();
        if let Some(advisor_cfg) = cfg.advisor.clone() {
            server = server.with_advisor(build_advisory_provider(advisor_cfg)?)?;
        }
        Ok(server)
    }

    pub fn with_db_path(db_path: impl AsRef<Path>) -> Result<Self, ServerError> {
        Ok(Self::with_backend(Box::new(PersistentRecordStore::open(
            db_path,
        )?)))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(InMemoryRecordStore::new()))
    }

    pub fn with_backend(store: Box<dyn StorageBackend>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            advisor: None,
            strict_inputs: false,
            secrets: Vec::new(),
        }
    }

    /// Attaches an advisory provider and the runtime its calls are driven on.
    pub fn with_advisor(mut self, provider: Arc<dyn AdvisoryProvider>) -> Result<Self, ServerError> {
        let runtime = tokio::runtime::Runtime::new()?;
        tracing::info!(provider = provider.name(), "advisory provider enabled");
        self.advisor = Some(Advisor { provider, runtime });
        Ok(self)
    }

    #[must_use]
    pub fn with_strict_inputs(mut self, strict: bool) -> Self {
        self.strict_inputs = strict;
        self
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method == "notifications/initialized" {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {"name": "cloud-roi-mcp", "version": env!("CARGO_PKG_VERSION")},
                        "capabilities": {
                            "tools": {
                                "listChanged": false
                            }
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
        };

        Some(response)
    }

    fn tools_list_result(&self) -> Value {
        let inputs_schema = json!({
            "type": "object",
            "description": "Complete calculator inputs in camelCase wire format (companyName, revenuePerYear, cloudSpendPerYear, engineers, ...)."
        });
        json!({
            "tools": [
                {
                    "name": "roi_compute",
                    "description": "Compute category scores, gains and ROI for one input set.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["inputs"],
                        "properties": {"inputs": inputs_schema}
                    }
                },
                {
                    "name": "roi_save",
                    "description": "Save inputs and results under the normalized company name, replacing any earlier save.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["inputs"],
                        "properties": {
                            "inputs": inputs_schema,
                            "outputs": {"type": "object", "description": "Results to store; computed when omitted."},
                            "timestamp": {"type": "string", "format": "date-time"}
                        }
                    }
                },
                {
                    "name": "roi_load_latest",
                    "description": "Load the most recently saved calculation.",
                    "inputSchema": {"type": "object", "properties": {}}
                },
                {
                    "name": "roi_get",
                    "description": "Load the saved calculation for a company.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["company_name"],
                        "properties": {"company_name": {"type": "string"}}
                    }
                },
                {
                    "name": "roi_delete",
                    "description": "Delete the saved calculation for a company.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["company_name"],
                        "properties": {"company_name": {"type": "string"}}
                    }
                },
                {
                    "name": "roi_list",
                    "description": "List saved calculations, most recent first.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"limit": {"type": "integer", "minimum": 1, "maximum": 100}}
                    }
                },
                {
                    "name": "roi_advise",
                    "description": "Ask the cloud optimization assistant about an input set.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["inputs", "query"],
                        "properties": {
                            "inputs": inputs_schema,
                            "query": {"type": "string"},
                            "history": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["role", "content"],
                                    "properties": {
                                        "role": {"type": "string", "enum": ["user", "assistant"]},
                                        "content": {"type": "string"}
                                    }
                                }
                            }
                        }
                    }
                },
                {
                    "name": "roi_greeting",
                    "description": "Opening assistant message quoting the current ROI.",
                    "inputSchema": {
                        "type": "object",
                        "required": ["inputs"],
                        "properties": {"inputs": inputs_schema}
                    }
                }
            ]
        })
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid params: {err}"));
            }
        };

        tracing::debug!(tool = %parsed.name, "tools/call");
        match parsed.name.as_str() {
            "roi_compute" => self.exec_roi_compute(id, parsed.arguments),
            "roi_save" => self.exec_roi_save(id, parsed.arguments),
            "roi_load_latest" => self.exec_roi_load_latest(id),
            "roi_get" => self.exec_roi_get(id, parsed.arguments),
            "roi_delete" => self.exec_roi_delete(id, parsed.arguments),
            "roi_list" => self.exec_roi_list(id, parsed.arguments),
            "roi_advise" => self.exec_roi_advise(id, parsed.arguments),
            "roi_greeting" => self.exec_roi_greeting(id, parsed.arguments),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "unknown tool"),
        }
    }

    fn exec_roi_compute(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: InputsArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let validation = match self.check_inputs(&args.inputs) {
            Ok(v) => v,
            Err(failure) => return failure.into_response(id),
        };

        let results = compute(&args.inputs);
        JsonRpcResponse::success(
            id,
            tool_result(
                json!({"results": results, "validation": validation}),
                summary_line(&args.inputs.company_name, &results),
            ),
        )
    }

    fn exec_roi_save(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: SaveArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        match self.save_record(args.inputs, args.outputs, args.timestamp) {
            Ok((record, validation)) => JsonRpcResponse::success(
                id,
                tool_result(
                    json!({"id": record.id, "record": record, "validation": validation}),
                    format!("saved {}", record.id),
                ),
            ),
            Err(failure) => failure.into_response(id),
        }
    }

    fn exec_roi_load_latest(&self, id: Value) -> JsonRpcResponse {
        match self.latest_record() {
            Ok(record) => {
                let text = record.as_ref().map_or_else(
                    || "no saved calculations".to_string(),
                    |r| format!("loaded {}", r.id),
                );
                JsonRpcResponse::success(id, tool_result(json!({"record": record}), text))
            }
            Err(failure) => failure.into_response(id),
        }
    }

    fn exec_roi_get(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CompanyArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        let store = match self.lock_store() {
            Ok(v) => v,
            Err(failure) => return failure.into_response(id),
        };
        match store.get(&args.company_name) {
            Ok(record) => {
                let text = record.as_ref().map_or_else(
                    || format!("no saved calculation for {}", args.company_name),
                    |r| format!("loaded {}", r.id),
                );
                JsonRpcResponse::success(id, tool_result(json!({"record": record}), text))
            }
            Err(err) => Failure::from(err).into_response(id),
        }
    }

    fn exec_roi_delete(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CompanyArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        match self.delete_record(&args.company_name) {
            Ok((deleted, key)) => JsonRpcResponse::success(
                id,
                tool_result(
                    json!({"deleted": deleted, "id": key}),
                    if deleted {
                        format!("deleted {key}")
                    } else {
                        format!("nothing saved under {key}")
                    },
                ),
            ),
            Err(failure) => failure.into_response(id),
        }
    }

    fn exec_roi_list(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ListArgs = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let limit = args.limit.unwrap_or(20).clamp(1, 100);

        let store = match self.lock_store() {
            Ok(v) => v,
            Err(failure) => return failure.into_response(id),
        };
        let items = store.list(limit);
        JsonRpcResponse::success(
            id,
            tool_result(
                json!({"count": items.len(), "limit": limit, "items": items}),
                format!("listed {} saved calculations", items.len()),
            ),
        )
    }

    fn exec_roi_advise(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: AdviseArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        match self.advise(args.inputs, args.query, args.history) {
            Ok(structured) => {
                let text = structured
                    .get("advice")
                    .and_then(Value::as_str)
                    .unwrap_or(FALLBACK_ADVICE)
                    .to_string();
                JsonRpcResponse::success(id, tool_result(structured, text))
            }
            Err(failure) => failure.into_response(id),
        }
    }

    fn exec_roi_greeting(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: InputsArgs = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        if let Err(failure) = self.check_inputs(&args.inputs) {
            return failure.into_response(id);
        }
        let results = compute(&args.inputs);
        let text = greeting(&results);
        JsonRpcResponse::success(
            id,
            tool_result(json!({"greeting": text, "results": results}), text.clone()),
        )
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Box<dyn StorageBackend>>, Failure> {
        self.store.lock().map_err(|_| Failure::lock())
    }

    fn check_inputs(&self, inputs: &InputValues) -> Result<ValidationReport, Failure> {
        let report = validate_inputs(inputs);
        if self.strict_inputs && report.has_errors() {
            return Err(Failure::rejected_inputs(&report));
        }
        Ok(report)
    }

    pub(crate) fn save_record(
        &self,
        inputs: InputValues,
        outputs: Option<CalculationResults>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(RoiRecord, ValidationReport), Failure> {
        let validation = self.check_inputs(&inputs)?;
        let outputs = outputs.unwrap_or_else(|| compute(&inputs));

        let mut store = self.lock_store()?;
        let record = store.upsert(NewRoiRecord {
            inputs,
            outputs,
            timestamp,
        })?;
        tracing::info!(id = %record.id, "calculation saved");
        Ok((record, validation))
    }

    pub(crate) fn latest_record(&self) -> Result<Option<RoiRecord>, Failure> {
        Ok(self.lock_store()?.latest())
    }

    /// Returns whether a record was removed and the key that was looked up.
    pub(crate) fn delete_record(&self, company_name: &str) -> Result<(bool, String), Failure> {
        let key = normalize_key(company_name)?;
        let deleted = self.lock_store()?.delete_by_key(company_name)?;
        if deleted {
            tracing::info!(id = %key, "calculation deleted");
        }
        Ok((deleted, key))
    }

    pub(crate) fn storage_stats(&self) -> Result<Value, Failure> {
        Ok(self.lock_store()?.stats())
    }

    fn advise(
        &self,
        inputs: InputValues,
        query: String,
        history: Vec<ChatMessage>,
    ) -> Result<Value, Failure> {
        if query.trim().is_empty() {
            return Err(Failure::invalid_params("query cannot be empty"));
        }
        let Some(advisor) = &self.advisor else {
            return Err(Failure::advisory_unavailable());
        };
        self.check_inputs(&inputs)?;

        let results = compute(&inputs);
        let mut request = AdvisoryRequest::new(inputs, results, query);
        request.history = history;

        let provider = advisor.provider.name();
        match advisor.runtime.block_on(advisor.provider.advise(request)) {
            Ok(res) => Ok(json!({
                "advice": res.advice,
                "provider": res.provider,
                "model": res.model,
                "usageTokens": res.usage_tokens,
                "degraded": false,
                "results": results
            })),
            Err(err) => {
                let message = provider_error_message(&err, &self.secrets);
                tracing::warn!(provider, error = %message, "advisory call failed, returning fallback");
                Ok(json!({
                    "advice": FALLBACK_ADVICE,
                    "provider": provider,
                    "degraded": true,
                    "error": message,
                    "results": results
                }))
            }
        }
    }
}

pub(crate) fn with_id(mut response: JsonRpcResponse, id: Value) -> JsonRpcResponse {
    response.id = id;
    response
}

fn tool_result(structured: Value, text: String) -> Value {
    json!({
        "structuredContent": structured,
        "content": [{"type": "text", "text": text}]
    })
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    let Some(args) = arguments else {
        return Err(JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            "missing tool arguments",
        ));
    };

    serde_json::from_value(args).map_err(|err| {
        JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            format!("invalid tool arguments: {err}"),
        )
    })
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    match arguments {
        Some(v) => serde_json::from_value(v).map_err(|err| {
            JsonRpcResponse::error(
                Value::Null,
                INVALID_PARAMS,
                format!("invalid tool arguments: {err}"),
            )
        }),
        None => Ok(T::default()),
    }
}

fn provider_error_message(err: &ProviderError, secrets: &[String]) -> String {
    match err {
        ProviderError::Config(msg) => {
            format!("Configuration error: {}", sanitize_sensitive(msg, secrets))
        }
        ProviderError::Http(msg) => {
            format!(
                "Network error: {}",
                sanitize_sensitive(&msg.to_string(), secrets)
            )
        }
        ProviderError::Serde(msg) => format!(
            "Serialization error: {}",
            sanitize_sensitive(&msg.to_string(), secrets)
        ),
        ProviderError::InvalidResponse(msg) => {
            format!(
                "Invalid provider response: {}",
                sanitize_sensitive(msg, secrets)
            )
        }
        ProviderError::Api { status, body } => {
            format!(
                "Provider API error (status {status}): {}",
                sanitize_sensitive(body, secrets)
            )
        }
    }
}

pub(crate) fn sanitize_sensitive(input: &str, secrets: &[String]) -> String {
    let mut out = input.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            out = out.replace(secret.as_str(), "[REDACTED]");
        }
    }

    for marker in ["key=", "api_key=", "api-key=", "apikey="] {
        out = redact_query_param(&out, marker);
    }
    out
}

fn redact_query_param(input: &str, marker: &str) -> String {
    let mut s = input.to_string();
    let mut start = 0usize;
    while let Some(pos) = s.get(start..).and_then(|rest| rest.find(marker)) {
        let abs = start + pos + marker.len();
        let tail = s.get(abs..).unwrap_or_default();
        let end_rel = tail
            .find(['&', ' ', '"', '\'', ')', '\n'])
            .unwrap_or(tail.len());
        if tail.get(..end_rel) == Some("[REDACTED]") {
            start = abs + end_rel;
            continue;
        }
        s.replace_range(abs..abs + end_rel, "[REDACTED]");
        start = abs + "[REDACTED]".len();
    }
    s
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct InputsArgs {
    inputs: InputValues,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveArgs {
    pub inputs: InputValues,
    #[serde(default)]
    pub outputs: Option<CalculationResults>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CompanyArgs {
    #[serde(alias = "companyName")]
    company_name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ListArgs {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AdviseArgs {
    inputs: InputValues,
    query: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_redacts_known_secrets_and_query_keys() {
        let secrets = vec!["sk-live-123".to_string()];
        let out = sanitize_sensitive(
            "auth sk-live-123 failed for https://x.test/v1?api-key=abc&key=def done",
            &secrets,
        );
        assert_eq!(
            out,
            "auth [REDACTED] failed for https://x.test/v1?api-key=[REDACTED]&key=[REDACTED] done"
        );
    }

    #[test]
    fn storage_invalid_input_maps_to_invalid_params() {
        let failure = Failure::from(StorageError::InvalidInput("companyName cannot be empty".into()));
        assert_eq!(failure.code, INVALID_PARAMS);
        assert_eq!(failure.status, 400);
    }

    #[test]
    fn strict_mode_rejects_inputs_with_errors() {
        let server = RoiServer::in_memory().with_strict_inputs(true);
        let inputs = InputValues {
            company_name: "Acme".to_string(),
            gross_margin: 140.0,
            ..InputValues::default()
        };
        let failure = server
            .save_record(inputs, None, None)
            .expect_err("strict rejection");
        assert_eq!(failure.status, 422);
        assert!(failure.message.contains("grossMargin"));
    }

    #[test]
    fn strict_mode_applies_to_greeting() {
        let server = RoiServer::in_memory().with_strict_inputs(true);
        let mut inputs = serde_json::to_value(InputValues::default()).expect("inputs json");
        inputs["cloudUsageHours"] = json!(200.0);
        let request: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "roi_greeting", "arguments": {"inputs": inputs}}
        }))
        .expect("request");

        let response = server.handle_request(request).expect("response");
        let error = response.error.expect("strict rejection");
        assert_eq!(error.code, INVALID_PARAMS);
        assert!(error.message.contains("cloudUsageHours"));
        assert_eq!(response.id, json!(7));
    }
}
