//! Tests for the data grid controller.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use trellis::model::{
    CellContent, Column, DataGrid, GridAction, GridOptions, SearchMode, cells, comparators,
};
use trellis::GridError;

fn machines() -> Vec<Value> {
    (0..22)
        .map(|i: usize| {
            let bmc = if i % 3 == 0 {
                Value::Null
            } else {
                json!({ "name": format!("bmc-{i}") })
            };
            let interfaces: Vec<Value> = (0..i % 3)
                .map(|n| json!({ "mac": format!("aa:bb:cc:00:{i:02x}:{n:02x}") }))
                .collect();
            json!({
                "id": i,
                "name": format!("machine-{i:02}"),
                "netbootEnabled": i % 2 == 0,
                "bmc": bmc,
                "interfaces": interfaces,
            })
        })
        .collect()
}

fn columns() -> Vec<Column<Value>> {
    vec![
        Column::new("Name", cells::text::<Value>("name")).with_sort(comparators::string("name")),
        Column::new(
            "BMC",
            cells::link::<Value, _>("bmc.name", |m| format!("/bmcs/{}", m["id"])),
        )
        .with_sort(comparators::string("bmc.name")),
        Column::new("Netboot", cells::toggle::<Value>("netbootEnabled"))
            .with_sort(comparators::boolean("netbootEnabled")),
        Column::new(
            "Interfaces",
            cells::lines::<Value, _>("interfaces", |intf| {
                intf["mac"].as_str().unwrap_or_default().to_string()
            }),
        )
        .with_sort(comparators::array_length("interfaces")),
        Column::new("Notes", cells::text::<Value>("notes")),
    ]
}

fn paged_grid() -> DataGrid<Value> {
    DataGrid::new(machines(), columns(), GridOptions::new().with_pagination(15)).unwrap()
}

fn visible_names(grid: &DataGrid<Value>) -> Vec<String> {
    grid.view()
        .visible_rows()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_22_rows_page_size_15() {
    let grid = paged_grid();

    let view = grid.view();
    assert_eq!(view.page_count, 2);
    assert_eq!(view.current_page, 0);
    assert_eq!(view.total_count, 22);
    assert_eq!(view.filtered_count, 22);
    assert_eq!(view.visible.len(), 15);

    assert_eq!(grid.change_page(1), 1);
    let view = grid.view();
    assert_eq!(view.visible.len(), 7);
    assert_eq!(visible_names(&grid).last().map(String::as_str), Some("machine-21"));
}

#[test]
fn test_change_page_clamps() {
    let grid = paged_grid();
    assert_eq!(grid.change_page(9), 1);
    assert_eq!(grid.state().page, 1);
}

#[test]
fn test_pages_cover_filtered_rows_once() {
    let grid = DataGrid::new(machines(), columns(), GridOptions::new().with_pagination(4)).unwrap();
    grid.change_search("machine-1");

    let view = grid.view();
    let mut seen = Vec::new();
    for page in 0..view.page_count {
        grid.change_page(page);
        seen.extend(grid.view().visible);
    }

    assert_eq!(seen.len(), view.filtered_count);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), seen.len());
}

#[test]
fn test_sort_round_trip() {
    let grid = DataGrid::new(machines(), columns(), GridOptions::default()).unwrap();

    grid.change_sort(0, false).unwrap();
    assert_eq!(visible_names(&grid)[0], "machine-21");

    grid.change_sort(0, true).unwrap();
    let names = visible_names(&grid);
    assert_eq!(names[0], "machine-00");
    assert_eq!(names.len(), 22);
}

#[test]
fn test_descending_boolean_sort_reverses_ties() {
    let grid = DataGrid::new(machines(), columns(), GridOptions::default()).unwrap();
    grid.change_sort(2, false).unwrap();

    let names = visible_names(&grid);
    assert_eq!(names[0], "machine-20");
    assert_eq!(names[10], "machine-00");
    assert_eq!(names[11], "machine-21");
}

#[test]
fn test_missing_bmc_sorts_first() {
    let grid = DataGrid::new(machines(), columns(), GridOptions::default()).unwrap();
    grid.change_sort(1, true).unwrap();

    let view = grid.view();
    let first = view.visible_rows().next().unwrap();
    assert_eq!(first["bmc"], Value::Null);
    assert_eq!(view.cells()[0][1], CellContent::Empty);
}

#[test]
fn test_no_match_has_no_pages() {
    let grid = paged_grid();
    grid.change_search("zzzzzzzz");

    let view = grid.view();
    assert_eq!(view.filtered_count, 0);
    assert_eq!(view.page_count, 0);
    assert!(view.is_empty());
    assert_eq!(grid.change_page(3), 0);
}

#[test]
fn test_fuzzy_ranking_without_active_sort() {
    let options = GridOptions::new()
        .with_search_keys(["name", "bmc.name"])
        .with_sort(4, true);
    let grid = DataGrid::new(machines(), columns(), options).unwrap();

    grid.change_search("machine-07");
    assert_eq!(visible_names(&grid)[0], "machine-07");
}

#[test]
fn test_substring_search_over_nested_keys() {
    let options = GridOptions::new()
        .with_search_keys(["interfaces.mac", "bmc.name"])
        .with_search_mode(SearchMode::Substring);
    let grid = DataGrid::new(machines(), columns(), options).unwrap();

    grid.change_search("AA:BB:CC:00:05");
    assert_eq!(visible_names(&grid), vec!["machine-05"]);

    grid.change_search("");
    assert_eq!(grid.view().visible, (0..22).collect::<Vec<_>>());
}

#[test]
fn test_search_resets_page() {
    let grid = paged_grid();
    grid.change_page(1);
    grid.change_search("machine");
    assert_eq!(grid.state().page, 0);

    let options = GridOptions::new()
        .with_pagination(15)
        .with_reset_page_on_search(false);
    let grid = DataGrid::new(machines(), columns(), options).unwrap();
    grid.change_page(1);
    grid.change_search("machine");
    assert_eq!(grid.state().page, 1);
}

#[test]
fn test_show_all() {
    let grid = paged_grid();
    grid.toggle_show_all();

    let view = grid.view();
    assert_eq!(view.visible.len(), 22);
    assert_eq!(view.page_count, 1);

    grid.toggle_show_all();
    assert_eq!(grid.view().visible.len(), 15);
}

#[test]
fn test_page_size_changes() {
    let grid = paged_grid();
    grid.change_page(1);

    grid.change_page_size(30).unwrap();
    assert_eq!(grid.state().page, 0);
    assert_eq!(grid.view().page_count, 1);

    grid.dispatch(GridAction::PageSize(5)).unwrap();
    assert_eq!(grid.view().page_count, 5);

    assert!(matches!(
        grid.change_page_size(0),
        Err(GridError::InvalidPageSize)
    ));
}

#[test]
fn test_rows_changed_sees_clamped_page() {
    let grid = Arc::new(paged_grid());
    let rendered = Arc::new(AtomicUsize::new(usize::MAX));
    let weak = Arc::downgrade(&grid);
    let sink = rendered.clone();
    grid.rows_changed().connect(move |_| {
        if let Some(grid) = weak.upgrade() {
            sink.store(grid.view().visible.len(), Ordering::SeqCst);
        }
    });

    grid.change_page(1);
    grid.set_rows(machines().into_iter().take(5).collect::<Vec<_>>());
    assert_eq!(rendered.load(Ordering::SeqCst), 5);
}

#[test]
fn test_set_rows_keeps_page_in_range() {
    let grid = paged_grid();
    let counts = Arc::new(AtomicUsize::new(0));
    let seen = counts.clone();
    grid.rows_changed().connect(move |count| {
        seen.store(*count, Ordering::SeqCst);
    });

    grid.change_page(1);
    grid.set_rows(machines().into_iter().take(5).collect::<Vec<_>>());

    assert_eq!(counts.load(Ordering::SeqCst), 5);
    assert_eq!(grid.row_count(), 5);
    assert_eq!(grid.state().page, 0);
    assert_eq!(grid.view().visible.len(), 5);
}

#[test]
fn test_state_changed_fires_on_effective_changes() {
    let grid = paged_grid();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    grid.state_changed().connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    grid.change_search("x");
    grid.change_search("x");
    grid.change_sort(1, true).unwrap();
    grid.toggle_show_all();

    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_invalid_column_and_options() {
    let grid = paged_grid();
    assert!(matches!(
        grid.dispatch(GridAction::Sort {
            column: 9,
            ascending: true
        }),
        Err(GridError::ColumnOutOfRange { index: 9, count: 5 })
    ));

    let result = DataGrid::new(machines(), columns(), GridOptions::new().with_sort(10, true));
    assert!(matches!(result, Err(GridError::ColumnOutOfRange { .. })));

    let result = DataGrid::new(
        machines(),
        columns(),
        GridOptions::new().with_match_threshold(2.0),
    );
    assert!(matches!(result, Err(GridError::InvalidOptions { .. })));
}

#[test]
fn test_options_from_toml() {
    let options = GridOptions::from_toml_str(
        r#"
        pagination = true
        page_size = 10
        search_keys = ["name"]
        sort_index = 0
        sort_ascending = false
        "#,
    )
    .unwrap();
    let grid = DataGrid::new(machines(), columns(), options).unwrap();

    let view = grid.view();
    assert_eq!(view.page_count, 3);
    assert_eq!(visible_names(&grid)[0], "machine-21");
}

#[test]
fn test_headers_and_rendered_cells() {
    let grid = DataGrid::new(machines(), columns(), GridOptions::default()).unwrap();
    grid.change_search("machine-05");
    grid.change_sort(4, true).unwrap();

    let view = grid.view();
    assert_eq!(view.headers(), vec!["Name", "BMC", "Netboot", "Interfaces", "Notes"]);
    assert_eq!(
        view.cells()[0],
        vec![
            CellContent::text("machine-05"),
            CellContent::Link {
                text: "bmc-5".into(),
                href: "/bmcs/5".into()
            },
            CellContent::Toggle { on: false },
            CellContent::Lines {
                lines: vec!["aa:bb:cc:00:05:00".into(), "aa:bb:cc:00:05:01".into()]
            },
            CellContent::Empty,
        ]
    );
}
