use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyser::{
    to_csv_string, to_json_string, MapSerializable, MapSerializer, Matcher, Result, Value,
};

#[derive(Debug, Clone)]
struct Address {
    city: String,
    postcode: String,
}

impl MapSerializable for Address {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        serializer.write_property_string("city", &self.city, false)?;
        serializer.write_property_string("postcode", &self.postcode, false)
    }
}

#[derive(Debug, Clone)]
struct Account {
    id: i64,
    name: String,
    active: bool,
    address: Address,
    tags: Vec<String>,
}

impl MapSerializable for Account {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        serializer.write_property_i64("id", self.id, false)?;
        serializer.write_property_string("name", &self.name, false)?;
        serializer.write_property_bool("active", self.active, false)?;
        serializer.write_property_map("address", &self.address, false)?;
        let tags: Vec<Value> = self.tags.iter().map(|tag| Value::String(tag)).collect();
        serializer.write_property_list("tags", &tags, false)
    }
}

fn account(id: i64) -> Account {
    Account {
        id,
        name: format!("account-{id}"),
        active: id % 2 == 0,
        address: Address {
            city: "London".to_string(),
            postcode: "N1 9GU".to_string(),
        },
        tags: vec!["alpha".to_string(), "beta".to_string()],
    }
}

fn account_root() -> Matcher {
    Matcher::root([
        ("id", Matcher::leaf(0, ",")),
        ("name", Matcher::leaf(1, ",")),
        ("active", Matcher::leaf(2, ",")),
        (
            "address",
            Matcher::recurse([
                ("city", Matcher::leaf(3, ",")),
                ("postcode", Matcher::leaf(4, ",")),
            ])
            .unwrap(),
        ),
        ("tags", Matcher::leaf(5, "|")),
    ])
    .unwrap()
}

fn benchmark_json(c: &mut Criterion) {
    let graph = account(7);
    c.bench_function("json_single_account", |b| {
        b.iter(|| to_json_string(black_box(&graph)))
    });
}

fn benchmark_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_accounts");
    for size in [10usize, 100, 1000] {
        let rows: Vec<Account> = (0..size as i64).map(account).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let records: Vec<&dyn MapSerializable> =
                    rows.iter().map(|row| row as &dyn MapSerializable).collect();
                to_csv_string(
                    account_root(),
                    &["id", "name", "active", "city", "postcode", "tags"],
                    true,
                    black_box(&records),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_json, benchmark_csv);
criterion_main!(benches);
