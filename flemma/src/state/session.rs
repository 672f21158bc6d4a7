/// One completed request's usage and cost, appended to the session ledger.
#[derive(Debug, Clone, Default)]
pub struct RequestRecord {
    pub doc_id: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// Append-only record of requests, usage, and cost across the process lifetime.
#[derive(Debug, Default)]
pub struct Session {
    records: std::sync::Mutex<Vec<RequestRecord>>,
}

impl Session {
    pub fn record(&self, record: RequestRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.records.lock().unwrap().iter().map(|r| r.cost_usd).sum()
    }

    pub fn records(&self) -> Vec<RequestRecord> {
        self.records.lock().unwrap().clone()
    }
}
