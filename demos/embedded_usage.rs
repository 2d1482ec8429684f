//! Minimal embedding example for dashkit
//!
//! Plugs a custom record provider into the reconciler, then shapes a small
//! table of the results with dashkit-dataviews.

use dashkit_core::{
    ProviderRegistry, RecordConfig, RecordKey, RecordProvider, RecordType, ReconcileConfig,
    Reconciler, Result, match_records,
};
use dashkit_dataviews::{
    Element, Field, FieldType, Filter, Operator, SortDirection, View, filter_sort_and_paginate,
    normalize_fields,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Custom provider keeping record sets in a plain map
struct EmbeddedProvider {
    records: Arc<Mutex<HashMap<RecordKey, Vec<String>>>>,
    mutations: Arc<AtomicUsize>,
}

impl EmbeddedProvider {
    fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            mutations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn seed(&self, record: RecordKey, values: &[&str]) {
        self.lock()
            .insert(record, values.iter().map(|v| v.to_string()).collect());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RecordKey, Vec<String>>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl RecordProvider for EmbeddedProvider {
    async fn list_values(&self, record: &RecordKey) -> Result<Vec<String>> {
        Ok(self.lock().get(record).cloned().unwrap_or_default())
    }

    async fn create_value(&self, record: &RecordKey, value: &str) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] {}: add {}", record, value);
        self.lock()
            .entry(record.clone())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn replace_value(&self, record: &RecordKey, from: &str, to: &str) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] {}: replace {} with {}", record, from, to);
        let mut records = self.lock();
        let slot = records
            .get_mut(record)
            .and_then(|values| values.iter_mut().find(|value| value.as_str() == from))
            .ok_or_else(|| dashkit_core::Error::not_found(format!("{} on {}", from, record)))?;
        *slot = to.to_string();
        Ok(())
    }

    async fn delete_value(&self, record: &RecordKey, value: &str) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] {}: remove {}", record, value);
        if let Some(values) = self.lock().get_mut(record)
            && let Some(index) = values.iter().position(|v| v == value)
        {
            values.remove(index);
        }
        Ok(())
    }

    fn supports_record(&self, record: &RecordKey) -> bool {
        record.record_type != RecordType::Txt
    }

    fn provider_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Embedded dashkit Example ===\n");

    println!("1. Matching on its own...");
    for pairing in match_records(
        &["ns1.other.com", "ns2.wordpress.com", "ns3.other.com"],
        &["ns1.wordpress.com", "ns2.wordpress.com", "ns3.wordpress.com"],
    ) {
        println!("   {}", pairing);
    }

    println!("\n2. Reconciling through a custom provider...");
    let nameservers = RecordKey::new("example.com", RecordType::Ns);
    let provider = EmbeddedProvider::new();
    provider.seed(nameservers.clone(), &["ns1.other.com", "ns2.wordpress.com"]);
    let mutations = Arc::clone(&provider.mutations);

    let mut config = ReconcileConfig::new().with_record(
        RecordConfig::new(nameservers.name.clone(), RecordType::Ns).with_target([
            "ns1.wordpress.com",
            "ns2.wordpress.com",
            "ns3.wordpress.com",
        ]),
    );
    config.engine.max_retries = 0;
    config.engine.event_channel_capacity = 100;

    let (reconciler, mut event_rx) = Reconciler::new(Box::new(provider), config)?;
    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    let report = reconciler.reconcile_all().await;
    drop(reconciler);
    let _ = event_listener.await;

    println!(
        "   applied {} change(s) with {} provider call(s)",
        report.applied(),
        mutations.load(Ordering::SeqCst)
    );

    println!("\n3. Registered providers: {:?}", ProviderRegistry::with_builtin().list_providers());

    println!("\n4. Shaping a table with dataviews...");
    let fields = normalize_fields([
        Field::new("name").with_type(FieldType::Text).with_label("Record").with_enable_global_search(true),
        Field::new("type").with_elements(vec![
            Element::new("A", "Address"),
            Element::new("NS", "Name server"),
        ]),
        Field::new("ttl").with_type(FieldType::Integer).with_label("TTL"),
    ]);
    let rows = vec![
        json!({ "name": "example.com", "type": "NS", "ttl": 3600 }),
        json!({ "name": "www.example.com", "type": "A", "ttl": 300 }),
        json!({ "name": "blog.example.com", "type": "A", "ttl": 14400 }),
    ];
    let view = View::default()
        .with_filter(Filter::new("type", Operator::IsAny, json!(["A"])))
        .with_sort("ttl", SortDirection::Desc)
        .with_page(1, 10);

    let (page, info) = filter_sort_and_paginate(&rows, &view, &fields);
    println!("   {}", fields.iter().map(|f| f.header.as_str()).collect::<Vec<_>>().join(" | "));
    for row in &page {
        let cells: Vec<String> = fields
            .iter()
            .map(|field| field.render(row).unwrap_or_default())
            .collect();
        println!("   {}", cells.join(" | "));
    }
    println!("   {} of {} row(s)", page.len(), info.total_items);

    println!("\n=== Embedding Successful ===");
    Ok(())
}
