use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn paginate_layout(json: &str) -> Result<JsValue, JsValue> {
    let layout = crate::paginate_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&layout)
        .map_err(|e| JsValue::from_str(&format!("Failed to convert layout: {}", e)))
}
