use crate::error::GalleryError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: i64,
    pub name: &'static str,
    pub description: &'static str,
    /// Attributes every category in the section accepts.
    #[serde(skip)]
    pub base_attributes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: &'static str,
    pub description: &'static str,
    pub section_id: i64,
    pub table: &'static str,
    #[serde(skip)]
    section: &'static Section,
    #[serde(skip)]
    pub extra_attributes: &'static [&'static str],
}

const FOR_SALE_ATTRS: &[&str] = &["title", "description", "price", "condition", "location", "contact"];
const HOUSING_ATTRS: &[&str] = &[
    "title",
    "description",
    "price",
    "bedrooms",
    "bathrooms",
    "available_from",
    "location",
    "contact",
];
const SERVICES_ATTRS: &[&str] = &["title", "description", "rate", "location", "contact"];
const JOBS_ATTRS: &[&str] = &[
    "title",
    "description",
    "company",
    "salary",
    "employment_type",
    "location",
    "contact",
];
const COMMUNITY_ATTRS: &[&str] = &["title", "description", "event_date", "location", "contact"];

const VEHICLE_ATTRS: &[&str] = &["make", "model", "year", "mileage"];

pub static SECTIONS: [Section; 5] = [
    Section {
        id: 1,
        name: "For Sale",
        description: "Buy and sell goods",
        base_attributes: FOR_SALE_ATTRS,
    },
    Section {
        id: 2,
        name: "Housing",
        description: "Apartments, rooms and rentals",
        base_attributes: HOUSING_ATTRS,
    },
    Section {
        id: 3,
        name: "Services",
        description: "Local services offered",
        base_attributes: SERVICES_ATTRS,
    },
    Section {
        id: 4,
        name: "Jobs",
        description: "Job openings",
        base_attributes: JOBS_ATTRS,
    },
    Section {
        id: 5,
        name: "Community",
        description: "Events, classes and neighbours",
        base_attributes: COMMUNITY_ATTRS,
    },
];

macro_rules! category {
    ($id:expr, $section:expr, $table:expr, $name:expr, $desc:expr) => {
        category!($id, $section, $table, $name, $desc, &[])
    };
    ($id:expr, $section:expr, $table:expr, $name:expr, $desc:expr, $extra:expr) => {
        Category {
            id: $id,
            name: $name,
            description: $desc,
            section_id: $section,
            section: &SECTIONS[$section - 1],
            table: $table,
            extra_attributes: $extra,
        }
    };
}

pub static CATEGORIES: [Category; 25] = [
    category!(1, 1, "cars_trucks", "Cars & Trucks", "Cars, trucks and vans", VEHICLE_ATTRS),
    category!(2, 1, "motorcycles", "Motorcycles", "Motorcycles and scooters", VEHICLE_ATTRS),
    category!(3, 1, "boats", "Boats", "Boats and watercraft", &["length", "year"]),
    category!(4, 1, "books", "Books", "Books and magazines", &["author", "isbn"]),
    category!(5, 1, "furniture", "Furniture", "Household furniture"),
    category!(6, 2, "apartments", "Apartments", "Apartments for rent"),
    category!(7, 2, "houses_rent", "Houses for Rent", "Whole houses for rent"),
    category!(8, 2, "rooms_shared", "Rooms & Shared", "Rooms and shared housing"),
    category!(9, 2, "vacation_rentals", "Vacation Rentals", "Short-term stays"),
    category!(10, 2, "parking_storage", "Parking & Storage", "Parking spots and storage units"),
    category!(11, 3, "automotive_services", "Automotive", "Repair and detailing"),
    category!(12, 3, "beauty_services", "Beauty", "Hair, nails and spa"),
    category!(13, 3, "computer_services", "Computer", "IT help and repair"),
    category!(14, 3, "household_services", "Household", "Cleaning, moving and handywork"),
    category!(15, 3, "tutoring_services", "Tutoring", "Lessons and tutoring", &["subject"]),
    category!(16, 4, "engineering_jobs", "Engineering", "Engineering positions"),
    category!(17, 4, "healthcare_jobs", "Healthcare", "Healthcare positions"),
    category!(18, 4, "education_jobs", "Education", "Teaching and education positions"),
    category!(19, 4, "customer_service_jobs", "Customer Service", "Customer service positions"),
    category!(20, 4, "construction_jobs", "Construction", "Construction and trades"),
    category!(21, 5, "events", "Events", "Local events"),
    category!(22, 5, "classes", "Classes", "Workshops and classes"),
    category!(23, 5, "lost_found", "Lost & Found", "Lost and found items"),
    category!(24, 5, "volunteers", "Volunteers", "Volunteer opportunities"),
    category!(25, 5, "general_community", "General", "General community posts"),
];

/// Resolve a category id to its storage table name.
pub fn resolve_table(category_id: i64) -> Result<&'static str, GalleryError> {
    category(category_id).map(|c| c.table)
}

pub fn category(category_id: i64) -> Result<&'static Category, GalleryError> {
    CATEGORIES
        .iter()
        .find(|c| c.id == category_id)
        .ok_or(GalleryError::CategoryNotFound(category_id))
}

/// Reverse lookup; the only way a table name from a URL reaches SQL.
pub fn category_for_table(table: &str) -> Result<&'static Category, GalleryError> {
    CATEGORIES
        .iter()
        .find(|c| c.table == table)
        .ok_or_else(|| GalleryError::TableNotFound(table.to_string()))
}

pub fn sections() -> &'static [Section] {
    &SECTIONS
}

pub fn categories() -> &'static [Category] {
    &CATEGORIES
}

pub fn categories_in(section_id: i64) -> impl Iterator<Item = &'static Category> {
    CATEGORIES.iter().filter(move |c| c.section_id == section_id)
}

impl Category {
    pub fn section(&self) -> &'static Section {
        self.section
    }

    /// Section base attributes followed by category extras, without duplicates.
    pub fn known_attributes(&self) -> Vec<&'static str> {
        let mut attrs: Vec<&'static str> = self.section().base_attributes.to_vec();
        for extra in self.extra_attributes {
            if !attrs.contains(extra) {
                attrs.push(extra);
            }
        }
        attrs
    }

    pub fn accepts(&self, attribute: &str) -> bool {
        self.section().base_attributes.contains(&attribute)
            || self.extra_attributes.contains(&attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ident::Ident;
    use std::collections::HashSet;

    #[test]
    fn every_registered_id_resolves_to_its_table() {
        let expected = [
            "cars_trucks",
            "motorcycles",
            "boats",
            "books",
            "furniture",
            "apartments",
            "houses_rent",
            "rooms_shared",
            "vacation_rentals",
            "parking_storage",
            "automotive_services",
            "beauty_services",
            "computer_services",
            "household_services",
            "tutoring_services",
            "engineering_jobs",
            "healthcare_jobs",
            "education_jobs",
            "customer_service_jobs",
            "construction_jobs",
            "events",
            "classes",
            "lost_found",
            "volunteers",
            "general_community",
        ];
        for (idx, table) in expected.iter().enumerate() {
            assert_eq!(resolve_table(idx as i64 + 1).unwrap(), *table);
        }
    }

    #[test]
    fn ids_outside_the_registry_fail() {
        for id in [0, -1, 26, 1000, i64::MAX] {
            assert!(matches!(
                resolve_table(id),
                Err(GalleryError::CategoryNotFound(got)) if got == id
            ));
        }
    }

    #[test]
    fn tables_are_unique_and_valid_identifiers() {
        let tables: HashSet<_> = categories().iter().map(|c| c.table).collect();
        assert_eq!(tables.len(), CATEGORIES.len());
        for table in tables {
            assert!(Ident::parse(table).is_ok(), "{table} should be a valid identifier");
        }
    }

    #[test]
    fn each_section_holds_five_categories() {
        for section in sections() {
            assert_eq!(categories_in(section.id).count(), 5);
        }
        assert_eq!(categories_in(42).count(), 0);
    }

    #[test]
    fn every_category_points_at_its_own_section() {
        for (idx, section) in sections().iter().enumerate() {
            assert_eq!(section.id, idx as i64 + 1);
        }
        for category in categories() {
            assert_eq!(category.section().id, category.section_id, "{}", category.table);
        }
        assert_eq!(category(24).unwrap().section().name, "Community");
        assert_eq!(category(16).unwrap().section().name, "Jobs");
    }

    #[test]
    fn reverse_lookup_rejects_unknown_tables() {
        assert_eq!(category_for_table("boats").unwrap().id, 3);
        assert!(matches!(
            category_for_table("users"),
            Err(GalleryError::TableNotFound(_))
        ));
    }

    #[test]
    fn known_attributes_merge_section_and_category() {
        let cars = category(1).unwrap();
        let attrs = cars.known_attributes();
        assert!(attrs.contains(&"title"));
        assert!(attrs.contains(&"condition"));
        assert!(attrs.contains(&"mileage"));
        assert!(cars.accepts("price"));
        assert!(!cars.accepts("salary"));
        for attr in attrs {
            assert!(Ident::parse_attribute(attr).is_ok());
        }
    }
}
