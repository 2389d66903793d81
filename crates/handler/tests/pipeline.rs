use resolvegate_handler::{
    DelegateOptions, ResolutionPlan, ResolveToByTransform, ResolverContext, Source, SourceField,
};
use resolvegate_planner::{empty_selection_set, StitchingInfo};
use resolvegate_schema::ComposedSchema;
use value::{value, ConstValue};

const SCHEMA: &str = r#"
type Query {
  items: [Item]
  item: Item
}

type Item {
  id: Int
  k: String
  v: Int
  n: Int
  nested: Item
}

type Holder {
  merged: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", mergeBy: "k")
  ascending: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", orderByPath: "n")
  descending: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", orderByPath: "n", orderByDirection: "desc")
  unique: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", uniqueByPath: "id")
  first: Item @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items")
  wrapped: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "item")
  values: [Int] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", result: "v")
  firstValue: Int @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", result: "[0].v")
  filtered: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "items", filterBy: "result.v > 1")
  rejected: Item @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "item", filterBy: "result.v > 100")
  rejectedList: [Item] @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "item", filterBy: "result.v > 100")
  hoisted: Int @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "item", hoistPath: "nested.v")
}
"#;

struct Fixed(ConstValue);

#[async_trait::async_trait]
impl SourceField for Fixed {
    async fn call(&self, _options: DelegateOptions) -> anyhow::Result<ConstValue> {
        Ok(self.0.clone())
    }
}

fn plan() -> ResolutionPlan {
    ResolveToByTransform
        .transform_schema(
            ComposedSchema::parse(SCHEMA).unwrap(),
            Some(StitchingInfo::default()),
        )
        .unwrap()
}

async fn resolve(field_name: &str, items: ConstValue, item: ConstValue) -> ConstValue {
    let ctx = ResolverContext::new().source(
        "S",
        Source::new()
            .field("Query", "items", Fixed(items))
            .field("Query", "item", Fixed(item)),
    );
    plan()
        .resolve(
            "Holder",
            field_name,
            &value!({}),
            &value!({}),
            empty_selection_set(),
            &ctx,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn merge_by_key() {
    let items = value!([
        { "k": "a", "v": 1 },
        { "k": "b", "v": 3 },
        { "k": "a", "v": 2, "n": null },
        { "v": 4 },
        { "k": "", "v": 5 },
    ]);
    assert_eq!(
        resolve("merged", items, ConstValue::Null).await,
        value!([{ "k": "a", "v": 2 }, { "k": "b", "v": 3 }])
    );
}

#[tokio::test]
async fn order_by_path() {
    let items = value!([
        { "id": 1, "n": 3 },
        { "id": 2, "n": 1 },
        { "id": 3, "n": 2 },
        { "id": 4, "n": 1 },
    ]);
    assert_eq!(
        resolve("ascending", items.clone(), ConstValue::Null).await,
        value!([
            { "id": 2, "n": 1 },
            { "id": 4, "n": 1 },
            { "id": 3, "n": 2 },
            { "id": 1, "n": 3 },
        ])
    );
    assert_eq!(
        resolve("descending", items, ConstValue::Null).await,
        value!([
            { "id": 1, "n": 3 },
            { "id": 3, "n": 2 },
            { "id": 2, "n": 1 },
            { "id": 4, "n": 1 },
        ])
    );
}

#[tokio::test]
async fn unique_by_path() {
    let items = value!([
        { "id": 1, "v": 1 },
        { "id": 2, "v": 2 },
        { "id": 1, "v": 3 },
    ]);
    assert_eq!(
        resolve("unique", items, ConstValue::Null).await,
        value!([{ "id": 1, "v": 1 }, { "id": 2, "v": 2 }])
    );
}

#[tokio::test]
async fn coerce_cardinality() {
    assert_eq!(
        resolve("first", value!([{ "id": 1 }, { "id": 2 }]), ConstValue::Null).await,
        value!({ "id": 1 })
    );
    assert_eq!(
        resolve("first", value!([]), ConstValue::Null).await,
        ConstValue::Null
    );
    assert_eq!(
        resolve("wrapped", ConstValue::Null, value!({ "id": 1 })).await,
        value!([{ "id": 1 }])
    );
}

#[tokio::test]
async fn null_passes_through() {
    assert_eq!(
        resolve("wrapped", ConstValue::Null, ConstValue::Null).await,
        ConstValue::Null
    );
}

#[tokio::test]
async fn extract_result_path() {
    let items = value!([{ "v": 1 }, { "v": 2 }, { "n": 3 }]);
    assert_eq!(
        resolve("values", items.clone(), ConstValue::Null).await,
        value!([1, 2, null])
    );
    assert_eq!(
        resolve("firstValue", items, ConstValue::Null).await,
        value!(1)
    );
}

#[tokio::test]
async fn filter_results() {
    let items = value!([{ "v": 1 }, { "v": 2 }, { "v": 3 }]);
    assert_eq!(
        resolve("filtered", items, ConstValue::Null).await,
        value!([{ "v": 2 }, { "v": 3 }])
    );
    assert_eq!(
        resolve("rejected", ConstValue::Null, value!({ "v": 1 })).await,
        ConstValue::Null
    );
    assert_eq!(
        resolve("rejectedList", ConstValue::Null, value!({ "v": 1 })).await,
        value!([])
    );
}

#[tokio::test]
async fn hoist_path() {
    let item = value!({ "v": 1, "nested": { "v": 7 } });
    assert_eq!(
        resolve("hoisted", ConstValue::Null, item).await,
        value!(7)
    );
}
