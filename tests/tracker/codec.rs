use tracklog::codec::{to_camel, to_kebab};

#[test]
fn single_capital_identifiers_round_trip() {
    let names = [
        "page",
        "pageId",
        "logParamsItem",
        "listItemIndex",
        "aB",
        "v2Layout",
    ];
    for name in names {
        assert_eq!(to_camel(&to_kebab(name)), name, "round trip for {name}");
    }
}

#[test]
fn markup_names_map_to_dataset_keys() {
    assert_eq!(to_camel("log-params-item"), "logParamsItem");
    assert_eq!(to_kebab("logParamsItem"), "log-params-item");
    assert_eq!(to_kebab("Leading"), "-leading");
}
