//! Keeps an "open invoice" view fresh while the selection changes.
//!
//! Run with: `cargo run -p garage-auto-refresh --example invoice_refresh`
//! Set `GARAGE_LOG_MODE=debug` to see per-tick traces.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use auto_refresh::logging::{init_logging, init_logging_from_env, is_initialized, LoggingMode};
use auto_refresh::{AutoRefresh, FetchError, FetchOperation, RefreshConfig};

#[derive(Debug, Clone)]
struct Invoice {
    number: u64,
    customer: String,
    total_cents: u64,
    paid: bool,
}

/// Stand-in for the app's invoice repository.
#[derive(Default)]
struct InvoiceStore {
    invoices: RwLock<HashMap<u64, Invoice>>,
}

/// What the view renders from.
#[derive(Default)]
struct InvoiceView {
    current: RwLock<Option<Invoice>>,
}

struct InvoiceFetcher {
    store: Arc<InvoiceStore>,
    view: Arc<InvoiceView>,
}

#[async_trait]
impl FetchOperation<u64> for InvoiceFetcher {
    async fn fetch(&self, number: u64) -> Result<(), FetchError> {
        // Simulated round trip to the backend
        tokio::time::sleep(Duration::from_millis(150)).await;

        let invoice = self
            .store
            .invoices
            .read()
            .get(&number)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("invoice {number}")))?;

        println!(
            "  rendered #{} for {}: {:.2} ({})",
            invoice.number,
            invoice.customer,
            invoice.total_cents as f64 / 100.0,
            if invoice.paid { "paid" } else { "open" }
        );
        *self.view.current.write() = Some(invoice);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;
    if !is_initialized() {
        init_logging(LoggingMode::Development)?;
    }

    let store = Arc::new(InvoiceStore::default());
    {
        let mut invoices = store.invoices.write();
        for (number, customer, total_cents) in [
            (1042, "R. Okafor", 48_950),
            (1043, "M. Lindqvist", 12_000),
        ] {
            invoices.insert(
                number,
                Invoice {
                    number,
                    customer: customer.to_string(),
                    total_cents,
                    paid: false,
                },
            );
        }
    }

    let view = Arc::new(InvoiceView::default());
    let fetcher = InvoiceFetcher {
        store: Arc::clone(&store),
        view: Arc::clone(&view),
    };

    let mut refresh = AutoRefresh::new(
        fetcher,
        RefreshConfig::default().with_interval(Duration::from_secs(1)),
    )?;
    let selection = refresh.handle();

    println!("Opening invoice 1042");
    selection.set_target(1042);
    refresh.start()?;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    println!("Invoice 1042 paid at the counter");
    if let Some(invoice) = store.invoices.write().get_mut(&1042) {
        invoice.paid = true;
    }
    tokio::time::sleep(Duration::from_millis(1200)).await;

    println!("Switching to invoice 1043");
    selection.set_target(1043);
    tokio::time::sleep(Duration::from_millis(2200)).await;

    println!("Selecting a deleted invoice");
    selection.set_target(999);
    tokio::time::sleep(Duration::from_millis(1200)).await;

    println!("Closing the view");
    refresh.stop().await?;

    if let Some(invoice) = view.current.read().as_ref() {
        println!("Last rendered invoice: #{}", invoice.number);
    }
    println!("{}", refresh.stats());

    Ok(())
}
