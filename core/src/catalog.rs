//! VAT item catalog: the fixed set of COICOP consumption items.
//!
//! Every item carries its label, whether it is standard-rated under the
//! baseline system, and the CPI category used to uprate it.
//! Codes outside the catalog are uprated with the overall CPI and are
//! never standard-rated.

use serde::{Deserialize, Serialize};

/// CPI category selecting the uprating factor for a consumption item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    Food,
    Alcohol,
    Energy,
    NonFood,
    Overall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatItem {
    pub code:                    &'static str,
    pub label:                   &'static str,
    pub baseline_standard_rated: bool,
    pub category:                PriceCategory,
}

#[rustfmt::skip]
const VAT_ITEMS: &[VatItem] = &[
    VatItem { code: "x0111", label: "Bread and cereals", baseline_standard_rated: false, category: PriceCategory::Food },
    VatItem { code: "x0112", label: "Meat", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0113", label: "Fish and seafood", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0114", label: "Milk, cheese and eggs", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0115", label: "Oils and fats", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0116", label: "Fruit", baseline_standard_rated: false, category: PriceCategory::Food },
    VatItem { code: "x0117", label: "Vegetables", baseline_standard_rated: false, category: PriceCategory::Food },
    VatItem { code: "x0118", label: "Sugar, jam, honey, chocolate", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0119", label: "Food products n.e.c.", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0121", label: "Coffee, tea and cocoa", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0122", label: "Mineral waters, soft drinks, juices", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x0211", label: "Spirits", baseline_standard_rated: true, category: PriceCategory::Alcohol },
    VatItem { code: "x0212", label: "Wine", baseline_standard_rated: true, category: PriceCategory::Alcohol },
    VatItem { code: "x0213", label: "Beer", baseline_standard_rated: true, category: PriceCategory::Alcohol },
    VatItem { code: "x0230", label: "Narcotics", baseline_standard_rated: true, category: PriceCategory::Overall },
    VatItem { code: "x0311", label: "Clothing materials", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0312", label: "Garments", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0313", label: "Other clothing, clothing accessories", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0314", label: "Cleaning, repair and hire of clothing", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0321", label: "Shoes and other footwear", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0322", label: "Repair and hire of footwear", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0411", label: "Actual rentals paid by tenants", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0412", label: "Other actual rentals", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0431", label: "Dwelling repair and maintenance materials", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0432", label: "Services for dwelling repair and maintenance", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0441", label: "Water supply", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0442", label: "Refuse collection", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0443", label: "Sewerage collection", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0444", label: "Other dwelling-related services", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0451", label: "Electricity", baseline_standard_rated: true, category: PriceCategory::Energy },
    VatItem { code: "x0452", label: "Gas", baseline_standard_rated: true, category: PriceCategory::Energy },
    VatItem { code: "x0453", label: "Liquid fuels", baseline_standard_rated: true, category: PriceCategory::Energy },
    VatItem { code: "x0454", label: "Solid fuels", baseline_standard_rated: true, category: PriceCategory::Energy },
    VatItem { code: "x0455", label: "Heat energy", baseline_standard_rated: true, category: PriceCategory::Energy },
    VatItem { code: "x0511", label: "Furniture and furnishings", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0512", label: "Carpets, other floor coverings", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0513", label: "Repair of furniture and floor coverings", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0531", label: "Major household appliances", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0532", label: "Small electric household appliances", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0533", label: "Repair of household appliances", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0551", label: "Major tools and equipment", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0552", label: "Small tools and misc accessories", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0561", label: "Non-durable household goods", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0562", label: "Domestic services, household services", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0611", label: "Pharmaceutical products", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0612", label: "Other medical products", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0613", label: "Therapeutic appliances and equipment", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0621", label: "Medical services", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0622", label: "Dental services", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0623", label: "Paramedical services", baseline_standard_rated: false, category: PriceCategory::NonFood },
    VatItem { code: "x0711", label: "Motor cars", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0712", label: "Motor cycles", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0713", label: "Bicycles", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0714", label: "Animal drawn vehicles", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0721", label: "Accessories for personal transport equipment (PTE)", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0722", label: "Fuels and lubricants for PTE", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0723", label: "Maintenance and repair of PTE", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0724", label: "Other services in respect of PTE", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0731", label: "Passenger transport by railway", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0732", label: "Passenger transport by road", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0733", label: "Passenger transport by air", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0734", label: "Passenger transport by water", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0735", label: "Combined passenger transport", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0810", label: "Postal services", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0911", label: "Equipment relating to sound and picture", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0912", label: "Photographic and cinematographic equipment", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0921", label: "Major durables for outdoor recreation", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0922", label: "Instruments and durables for indoor recreation", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0923", label: "Maintenance of other durables for recreation", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0931", label: "Games, toys and hobbies", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0932", label: "Equipment for sports and open-air recreation", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0941", label: "Recreational and sporting services", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0951", label: "Books", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x0960", label: "Package holidays", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x1111", label: "Restaurants and cafés", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x1112", label: "Canteens", baseline_standard_rated: true, category: PriceCategory::Food },
    VatItem { code: "x1211", label: "Hairdressing salons and similar", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x1212", label: "Electrical appliances for personal care", baseline_standard_rated: true, category: PriceCategory::NonFood },
    VatItem { code: "x1213", label: "Other products for personal care", baseline_standard_rated: true, category: PriceCategory::NonFood },
];

/// Lookup over the built-in item table.
#[derive(Debug, Clone, Copy, Default)]
pub struct VatCatalog;

impl VatCatalog {
    pub fn items(&self) -> &'static [VatItem] {
        VAT_ITEMS
    }

    pub fn len(&self) -> usize {
        VAT_ITEMS.len()
    }

    pub fn is_empty(&self) -> bool {
        VAT_ITEMS.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&'static VatItem> {
        VAT_ITEMS.iter().find(|item| item.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn label<'a>(&self, code: &'a str) -> &'a str {
        self.get(code).map(|item| item.label).unwrap_or(code)
    }

    /// Uprating category; unknown codes fall back to the overall CPI.
    pub fn category(&self, code: &str) -> PriceCategory {
        self.get(code)
            .map(|item| item.category)
            .unwrap_or(PriceCategory::Overall)
    }

    pub fn all_codes(&self) -> Vec<String> {
        VAT_ITEMS.iter().map(|item| item.code.to_string()).collect()
    }

    /// Items standard-rated under the baseline system, in catalog order.
    pub fn baseline_standard_rated(&self) -> Vec<String> {
        VAT_ITEMS
            .iter()
            .filter(|item| item.baseline_standard_rated)
            .map(|item| item.code.to_string())
            .collect()
    }
}

/// True for column names holding item-level consumption (`x` + digit).
pub fn is_item_column(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('x') && chars.next().is_some_and(|c| c.is_ascii_digit())
}
