use serde_json::Value;

/// Recursively merges `overlay` onto a copy of `base`.
///
/// Objects present on both sides are merged key by key; any other overlay
/// value replaces the base value wholesale. Keys present on only one side are
/// kept. `base` is never modified, so the same template can be reused for
/// every run of a campaign.
pub fn deep_update(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    deep_update_in_place(&mut merged, overlay.clone());
    merged
}

/// In-place variant of [`deep_update`] used for accumulators.
pub fn deep_update_in_place(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let nested = value.is_object() && target_map.get(&key).is_some_and(Value::is_object);
                match target_map.get_mut(&key) {
                    Some(existing) if nested => deep_update_in_place(existing, value),
                    _ => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}
