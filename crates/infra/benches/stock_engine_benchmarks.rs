use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rust_decimal::Decimal;

use stockledger_catalog::{DryGood, NewProduct, NewWarehouse, ProductKind};
use stockledger_core::{Sku, StaffId, TransactionId, WarehouseId};
use stockledger_infra::{Inventory, InventoryConfig};
use stockledger_ledger::{RecordInbound, ShippingType};

const WAREHOUSE: WarehouseId = WarehouseId::new(1);

fn inventory_with_skus(skus: u64) -> Inventory {
    let inventory = Inventory::in_memory(InventoryConfig::default());
    inventory
        .warehouses()
        .register(NewWarehouse {
            id: Some(WAREHOUSE),
            name: "Bench".to_string(),
            location: String::new(),
        })
        .unwrap();
    for sku in 1..=skus {
        inventory
            .catalog()
            .create_product(NewProduct {
                sku: Some(Sku::new(sku)),
                warehouse_id: WAREHOUSE,
                name: format!("item-{sku}"),
                brand: String::new(),
                description: String::new(),
                purchase_price: Decimal::ONE,
                weight_per_unit_kg: 1.0,
                volume_per_unit_m3: 0.001,
                initial_quantity: 0,
                kind: ProductKind::DryGood(DryGood::default()),
            })
            .unwrap();
    }
    inventory
}

fn record(inventory: &Inventory, sku: u64) -> TransactionId {
    inventory
        .ledger()
        .record_inbound(RecordInbound {
            staff_id: StaffId::new(),
            sku: Sku::new(sku),
            quantity: 1,
            date: None,
            shipping_type: ShippingType::StandardGround,
        })
        .unwrap()
        .id_typed()
}

/// Record + commit on a single thread.
fn bench_record_and_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_and_commit");
    group.throughput(Throughput::Elements(1));

    let inventory = inventory_with_skus(1);
    group.bench_function("single_sku", |b| {
        b.iter(|| {
            let id = record(&inventory, 1);
            inventory.engine().commit(id).unwrap();
        })
    });

    group.finish();
}

/// Four threads committing: all on one SKU (serialized) vs. one SKU each.
fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_contention");
    const THREADS: u64 = 4;
    const PER_THREAD: u64 = 250;
    group.throughput(Throughput::Elements(THREADS * PER_THREAD));

    for distinct_skus in [1u64, THREADS] {
        group.bench_with_input(
            BenchmarkId::new("skus", distinct_skus),
            &distinct_skus,
            |b, &distinct_skus| {
                b.iter_batched(
                    || {
                        let inventory = Arc::new(inventory_with_skus(distinct_skus));
                        let batches: Vec<Vec<TransactionId>> = (0..THREADS)
                            .map(|t| {
                                let sku = 1 + t % distinct_skus;
                                (0..PER_THREAD).map(|_| record(&inventory, sku)).collect()
                            })
                            .collect();
                        (inventory, batches)
                    },
                    |(inventory, batches)| {
                        let handles: Vec<_> = batches
                            .into_iter()
                            .map(|ids| {
                                let inventory = inventory.clone();
                                thread::spawn(move || {
                                    for id in ids {
                                        inventory.engine().commit(id).unwrap();
                                    }
                                })
                            })
                            .collect();
                        for h in handles {
                            h.join().unwrap();
                        }
                    },
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_record_and_commit, bench_contention);
criterion_main!(benches);
