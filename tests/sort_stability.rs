use gridserve::order::{ColumnType, SortDirection};
use gridserve::request::RequestData;
use gridserve::row::RowSpec;
use gridserve::server_data::ServerData;
use proptest::prelude::*;

proptest! {
    /// Rows with equal keys keep their original relative order
    #[test]
    fn sort_is_stable(keys in prop::collection::vec(0u8..4, 0..60), descending in any::<bool>()) {
        let table = ServerData::builder(2)
            .column_type(0, ColumnType::Int)
            .rows(keys.iter().enumerate().map(|(i, key)| {
                RowSpec::from_texts([key.to_string(), i.to_string()])
            }))
            .build()
            .unwrap();

        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let state = table.sort_state_for(&RequestData::default().with_order(0, Some(direction)).order);
        table.apply_sort_if_changed(&state);

        let sorted: Vec<(u8, usize)> = table
            .all_rows()
            .iter()
            .map(|row| {
                let key = row.cells()[0].text().parse().unwrap();
                let position = row.cells()[1].text().parse().unwrap();
                (key, position)
            })
            .collect();

        prop_assert_eq!(sorted.len(), keys.len());
        for pair in sorted.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if descending {
                prop_assert!(left.0 >= right.0);
            } else {
                prop_assert!(left.0 <= right.0);
            }
            if left.0 == right.0 {
                prop_assert!(left.1 < right.1);
            }
        }
    }
}
