#[cfg(test)]
mod tests {
    use crate::engine::{compare_objects, CompareEngine};
    use crate::path::NodePath;
    use crate::resolver::MatchResolver;
    use crudiff_common::{DescendPolicy, MatchOnMap};
    use serde_json::{json, Value};

    // ============================================================================
    // Fixture
    // ============================================================================

    fn original_car() -> Value {
        json!({
            "id": 1,
            "brand": "Toyota",
            "model": "Corolla",
            "year": 2020,
            "features": ["AC", "Radio"],
            "owners": [
                { "id": 1, "name": "John", "since": "2020-01-01" },
                { "id": 2, "name": "Jane", "since": "2021-05-15" }
            ],
            "specifications": { "engine": "2.0L", "fuel": "gasoline" },
            "maintenance": [
                {
                    "id": 1, "date": "2020-06-01", "service": "Oil Change", "cost": 50,
                    "parts": [
                        { "id": 1, "name": "Engine Oil", "brand": "Toyota", "price": 30 },
                        { "id": 2, "name": "Oil Filter", "brand": "Toyota", "price": 20 }
                    ]
                },
                {
                    "id": 2, "date": "2021-01-15", "service": "Tire Rotation", "cost": 25,
                    "parts": [
                        { "id": 3, "name": "Wheel Bolts", "brand": "Generic", "price": 15 }
                    ]
                }
            ]
        })
    }

    fn modified_car() -> Value {
        json!({
            "id": 1,
            "brand": "Toyota",
            "model": "Corolla LE",
            "year": 2020,
            "features": ["AC", "Radio", "GPS"],
            "owners": [
                { "id": 1, "name": "John Doe", "since": "2020-01-01" },
                { "id": 3, "name": "Bob", "since": "2023-01-01" }
            ],
            "specifications": { "engine": "2.0L", "fuel": "hybrid" },
            "maintenance": [
                {
                    "id": 1, "date": "2020-06-01", "service": "Oil Change", "cost": 50,
                    "parts": [
                        { "id": 2, "name": "Oil Filter", "brand": "Toyota", "price": 15 },
                        { "id": 3, "name": "Oil Filter", "brand": "Toyota", "price": 15 }
                    ]
                },
                {
                    "id": 2, "date": "2021-01-15", "service": "Tire Rotation", "cost": 25,
                    "parts": [
                        { "id": 3, "name": "Wheel Bolts", "brand": "Generic", "price": 10 }
                    ]
                },
                {
                    "id": 3, "date": "2022-03-10", "service": "Brake Replacement", "cost": 300,
                    "parts": [
                        { "id": 4, "name": "Brake Pads", "brand": "Brembo", "price": 150 },
                        { "id": 5, "name": "Brake Discs", "brand": "Brembo", "price": 120 },
                        { "id": 6, "name": "Brake Fluid", "brand": "Toyota", "price": 30 }
                    ]
                }
            ]
        })
    }

    fn car_match_on() -> MatchOnMap {
        serde_json::from_value(json!({
            "owners": ["id"],
            "features": [],
            "maintenance": {
                "matchOn": ["id"],
                "children": { "parts": ["id"] }
            }
        }))
        .unwrap()
    }

    fn id_ops(items: &Value) -> Vec<(i64, String)> {
        items
            .as_array()
            .expect("array of elements")
            .iter()
            .map(|item| {
                (
                    item["id"].as_i64().expect("numeric id"),
                    item["_op"].as_str().expect("tagged element").to_string(),
                )
            })
            .collect()
    }

    fn pairs(expected: &[(i64, &str)]) -> Vec<(i64, String)> {
        expected
            .iter()
            .map(|(id, op)| (*id, op.to_string()))
            .collect()
    }

    fn compare_car() -> Value {
        compare_objects(&original_car(), &modified_car(), &car_match_on()).into_json()
    }

    // ============================================================================
    // Owners / features / scalar properties
    // ============================================================================

    #[test]
    fn test_owners_reconciled_by_id() {
        let result = compare_car();
        assert_eq!(
            id_ops(&result["owners"]),
            pairs(&[(1, "update"), (3, "insert"), (2, "delete")])
        );
        assert_eq!(result["owners"][2]["name"], json!("Jane"));
    }

    #[test]
    fn test_features_tagged_as_whole_array() {
        let result = compare_car();
        assert_eq!(
            result["features"],
            json!({ "_op": "update", "_items": ["AC", "Radio", "GPS"] })
        );
    }

    #[test]
    fn test_scalar_changes_tag_their_container() {
        let result = compare_car();
        assert_eq!(result["_op"], json!("update"));
        assert_eq!(result["model"], json!("Corolla LE"));
        assert_eq!(result["specifications"]["_op"], json!("update"));
        assert_eq!(result["specifications"]["fuel"], json!("hybrid"));
    }

    // ============================================================================
    // Maintenance and nested parts
    // ============================================================================

    #[test]
    fn test_maintenance_reconciled_by_node_match_on() {
        let result = compare_car();
        assert_eq!(
            id_ops(&result["maintenance"]),
            pairs(&[(1, "update"), (2, "update"), (3, "insert")])
        );
    }

    #[test]
    fn test_parts_resolved_through_children() {
        let map = car_match_on();
        assert!(!map.contains_key("maintenance.parts"));
        let resolver = MatchResolver::new(&map);
        let fields = resolver.resolve(&NodePath::parse("maintenance[0].parts").unwrap());
        assert_eq!(fields, Some(&["id".to_string()][..]));

        let result = compare_car();
        assert_eq!(
            id_ops(&result["maintenance"][0]["parts"]),
            pairs(&[(2, "update"), (3, "insert"), (1, "delete")])
        );
        assert_eq!(
            id_ops(&result["maintenance"][1]["parts"]),
            pairs(&[(3, "update")])
        );
    }

    #[test]
    fn test_inserted_maintenance_cascades_into_parts() {
        let result = compare_car();
        let parts = &result["maintenance"][2]["parts"];

        // Same shape as the parts of surviving records: a plain array
        assert!(parts.is_array());
        assert_eq!(
            id_ops(parts),
            pairs(&[(4, "insert"), (5, "insert"), (6, "insert")])
        );
    }

    // ============================================================================
    // Properties
    // ============================================================================

    #[test]
    fn test_identical_car_is_all_none() {
        let car = original_car();
        let result = compare_objects(&car, &car, &car_match_on()).into_json();

        assert_eq!(result["_op"], json!("none"));
        assert_eq!(result["features"]["_op"], json!("none"));
        assert_eq!(result["specifications"]["_op"], json!("none"));
        assert_eq!(id_ops(&result["owners"]), pairs(&[(1, "none"), (2, "none")]));
        assert_eq!(
            id_ops(&result["maintenance"]),
            pairs(&[(1, "none"), (2, "none")])
        );
        assert_eq!(
            id_ops(&result["maintenance"][0]["parts"]),
            pairs(&[(1, "none"), (2, "none")])
        );
    }

    #[test]
    fn test_permuted_owners_give_same_identity_ops() {
        let mut permuted = modified_car();
        permuted["owners"].as_array_mut().unwrap().reverse();

        let baseline = compare_car();
        let result = compare_objects(&original_car(), &permuted, &car_match_on()).into_json();

        let mut expected = id_ops(&baseline["owners"]);
        let mut actual = id_ops(&result["owners"]);
        expected.sort();
        actual.sort();
        assert_eq!(expected, actual);
        assert_eq!(result["owners"][2]["_op"], json!("delete"));
    }

    fn parts_by_maintenance(result: &Value) -> Vec<(i64, Vec<(i64, String)>)> {
        let mut records: Vec<(i64, Vec<(i64, String)>)> = result["maintenance"]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| (record["id"].as_i64().unwrap(), id_ops(&record["parts"])))
            .collect();
        records.sort_by_key(|(id, _)| *id);
        records
    }

    #[test]
    fn test_permuted_maintenance_keeps_parts_with_their_record() {
        let mut permuted = modified_car();
        permuted["maintenance"].as_array_mut().unwrap().reverse();

        let baseline = compare_car();
        let result = compare_objects(&original_car(), &permuted, &car_match_on()).into_json();

        assert_eq!(parts_by_maintenance(&result), parts_by_maintenance(&baseline));
        assert_eq!(
            parts_by_maintenance(&result),
            vec![
                (1, pairs(&[(2, "update"), (3, "insert"), (1, "delete")])),
                (2, pairs(&[(3, "update")])),
                (3, pairs(&[(4, "insert"), (5, "insert"), (6, "insert")])),
            ]
        );
    }

    #[test]
    fn test_permuted_original_maintenance() {
        let mut shuffled = original_car();
        shuffled["maintenance"].as_array_mut().unwrap().reverse();

        let result = compare_objects(&shuffled, &original_car(), &car_match_on()).into_json();
        assert_eq!(
            parts_by_maintenance(&result),
            vec![
                (1, pairs(&[(1, "none"), (2, "none")])),
                (2, pairs(&[(3, "none")])),
            ]
        );
    }

    #[test]
    fn test_descend_policies_agree_on_fixture() {
        let engine = CompareEngine::new().with_match_on(car_match_on());
        let always = engine
            .clone()
            .with_descend_policy(DescendPolicy::Always)
            .compare(&original_car(), &modified_car())
            .into_json();
        let nested_only = engine
            .with_descend_policy(DescendPolicy::NestedOnly)
            .compare(&original_car(), &modified_car())
            .into_json();

        assert_eq!(always, nested_only);
    }

    #[test]
    fn test_without_config_objects_pair_by_index() {
        let result = compare_objects(&original_car(), &modified_car(), &MatchOnMap::new())
            .into_json();

        // Position 1 holds Jane in the original and Bob in the modified car
        assert_eq!(id_ops(&result["owners"]), pairs(&[(1, "update"), (3, "update")]));
        assert_eq!(
            id_ops(&result["maintenance"]),
            pairs(&[(1, "update"), (2, "update"), (3, "insert")])
        );
    }
}
