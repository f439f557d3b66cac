use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sql_entity;

/// One row of `Production.GetProductPriceCategory`: a product with its
/// prices and category names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategoryPrice {
    #[serde(rename = "productID")]
    pub product_id: i32,
    pub name: String,
    pub product_number: String,
    pub color: Option<String>,
    pub standard_cost: Decimal,
    pub list_price: Decimal,
    pub size: String,
    pub size_unit_measure_code: Option<String>,
    #[serde(rename = "productCategoryID")]
    pub product_category_id: Option<i32>,
    pub product_category: String,
    #[serde(rename = "productSubcategoryID")]
    pub product_subcategory_id: Option<i32>,
    pub product_subcategory: String,
}

sql_entity!(ProductCategoryPrice {
    "ProductID" => product_id,
    "Name" => name,
    "ProductNumber" => product_number,
    "Color" => color,
    "StandardCost" => standard_cost,
    "ListPrice" => list_price,
    "Size" => size,
    "SizeUnitMeasureCode" => size_unit_measure_code,
    "ProductCategoryID" => product_category_id,
    "ProductCategory" => product_category,
    "ProductSubcategoryID" => product_subcategory_id,
    "ProductSubcategory" => product_subcategory,
});
