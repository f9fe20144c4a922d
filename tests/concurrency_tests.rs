use gridserve::engine;
use gridserve::order::{ColumnType, SortDirection};
use gridserve::request::RequestData;
use gridserve::row::RowSpec;
use gridserve::server_data::ServerData;
use std::thread;

fn numbers(count: usize) -> ServerData {
    ServerData::builder(2)
        .column_type(0, ColumnType::Int)
        .rows((0..count).map(|i| {
            let parity = if i % 2 == 0 { "even" } else { "odd" };
            RowSpec::from_texts([((i * 7919) % count).to_string(), parity.to_string()])
        }))
        .build()
        .unwrap()
}

#[test]
fn test_parallel_filters_match_single_threaded() {
    let table = numbers(500);
    let request = RequestData::with_columns(2).with_search("even", false).with_page(10, 25);
    let expected = engine::serve(&table, &request).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine::serve(&table, &request).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(table.sort_count(), 0);
}

#[test]
fn test_concurrent_requests_for_one_new_order_sort_once() {
    let table = numbers(2000);
    let request = RequestData::with_columns(2)
        .with_order(0, Some(SortDirection::Desc))
        .with_page(0, 3);

    thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                let response = engine::serve(&table, &request).unwrap();
                let first: Vec<&str> = response.data.iter().map(|r| r.cells[0].as_str()).collect();
                assert_eq!(first, vec!["1999", "1998", "1997"]);
            });
        }
    });
    assert_eq!(table.sort_count(), 1);
}

#[test]
fn test_each_request_sees_its_own_order() {
    let table = numbers(300);
    let ascending = RequestData::with_columns(2).with_order(0, Some(SortDirection::Asc)).with_page(0, 1);
    let descending = RequestData::with_columns(2).with_order(0, Some(SortDirection::Desc)).with_page(0, 1);

    thread::scope(|scope| {
        for i in 0..20 {
            let (request, expected) = if i % 2 == 0 {
                (&ascending, "0")
            } else {
                (&descending, "299")
            };
            let table = &table;
            scope.spawn(move || {
                let response = engine::serve(table, request).unwrap();
                assert_eq!(response.data[0].cells[0], expected);
            });
        }
    });
}
