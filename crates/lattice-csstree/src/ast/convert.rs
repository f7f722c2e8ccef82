//! Conversion between the list-based tree and its plain JSON form.

use serde_json::Value;

use crate::error::Result;

use super::Node;

/// Convert a tree into plain JSON objects and arrays.
pub fn to_plain_object(node: &Node) -> Result<Value> {
    Ok(serde_json::to_value(node)?)
}

/// Rebuild a tree from its plain form.
///
/// Fails on unknown node types, unknown fields and missing required fields.
pub fn from_plain_object(value: Value) -> Result<Node> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::List;
    use serde_json::json;

    #[test]
    fn converts_to_plain_form() {
        let node = Node::value(List::from_vec(vec![Node::identifier("red"), Node::white_space()]));

        let plain = to_plain_object(&node).unwrap();

        assert_eq!(
            plain,
            json!({
                "type": "Value",
                "loc": null,
                "children": [
                    { "type": "Identifier", "loc": null, "name": "red" },
                    { "type": "WhiteSpace", "loc": null, "value": " " }
                ]
            })
        );
    }

    #[test]
    fn converts_back_from_plain_form() {
        let plain = json!({
            "type": "Declaration",
            "important": "ie",
            "property": "color",
            "value": { "type": "Raw", "value": "red" }
        });

        let node = from_plain_object(plain.clone()).unwrap();

        match &node {
            Node::Declaration(declaration) => {
                assert_eq!(declaration.property, "color");
                assert_eq!(*declaration.value, Node::raw("red"));
            }
            other => panic!("unexpected node {other:?}"),
        }
        assert_eq!(from_plain_object(to_plain_object(&node).unwrap()).unwrap(), node);
    }

    #[test]
    fn rejects_unknown_fields_and_types() {
        assert!(from_plain_object(json!({ "type": "Identifier", "name": "a", "extra": 1 })).is_err());
        assert!(from_plain_object(json!({ "type": "Bogus" })).is_err());
        assert!(from_plain_object(json!({ "type": "Identifier" })).is_err());
    }
}
