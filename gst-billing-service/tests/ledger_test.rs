mod common;

use axum::http::StatusCode;
use common::{invoice, widget, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn sequential_invoices_are_listed_in_submission_order() {
    let app = TestApp::spawn().await;

    for n in 1..=5 {
        let response = app
            .post_invoice(&invoice(&format!("20{n}"), vec![widget()]))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let invoices = app.list_invoices().await;
    let numbers: Vec<&str> = invoices
        .iter()
        .map(|i| i["inv_num"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, ["201", "202", "203", "204", "205"]);
    assert_eq!(app.ledger_rows().len(), 5);
}

#[tokio::test]
async fn listed_invoice_carries_decoded_items_and_totals() {
    let app = TestApp::spawn().await;
    let bolt = json!({"desc": "Bolt", "hsn": "7318", "qty": "10", "rate": "1.50", "gst": "12", "total": "16.80"});

    app.post_invoice(&invoice("301", vec![widget(), bolt])).await;

    let invoices = app.list_invoices().await;
    let entry = &invoices[0];
    assert_eq!(entry["cust_name"], "Acme Traders");
    assert_eq!(entry["items_raw"], "Widget,1234,2,100,18,236|Bolt,7318,10,1.50,12,16.80");
    let items = entry["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["desc"], "Bolt");
    assert_eq!(items[1]["rate"], "1.50");
    let total: f64 = entry["total_invoice_amount"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, 252.8);
}

#[tokio::test]
async fn description_with_a_comma_does_not_decode() {
    let app = TestApp::spawn().await;
    let item = json!({"desc": "Widget, large", "hsn": "1234", "qty": 1, "rate": 1, "gst": 0, "total": 1});

    let response = app.post_invoice(&invoice("302", vec![item])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let invoices = app.list_invoices().await;
    assert_eq!(invoices[0]["items"], Value::Null);
    assert_eq!(invoices[0]["items_raw"], "Widget, large,1234,1,1,0,1");
}

#[tokio::test]
async fn invoice_lookup_returns_every_row_with_that_number() {
    let app = TestApp::spawn().await;

    app.post_invoice(&invoice("401", vec![widget()])).await;
    app.post_invoice(&invoice("402", vec![])).await;
    app.post_invoice(&invoice("401", vec![])).await;

    let response = app
        .client
        .get(format!("{}/invoices/401", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["inv_num"] == "401"));
}

#[tokio::test]
async fn unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/invoices/999", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invoice 999 not found");
}

#[tokio::test]
async fn concurrent_submissions_are_all_recorded() {
    let app = TestApp::spawn().await;

    let handles: Vec<_> = (0..12)
        .map(|n| {
            let client = app.client.clone();
            let url = format!("{}/save_invoice", app.address);
            let body = invoice(&format!("C{n}"), vec![widget()]);
            tokio::spawn(async move { client.post(url).json(&body).send().await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut numbers: Vec<String> = app
        .list_invoices()
        .await
        .iter()
        .map(|i| i["inv_num"].as_str().unwrap().to_string())
        .collect();
    numbers.sort();
    let mut expected: Vec<String> = (0..12).map(|n| format!("C{n}")).collect();
    expected.sort();
    assert_eq!(numbers, expected);
}
