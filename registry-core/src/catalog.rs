//! Danh mục cố định của bệnh viện: khoa/phòng và barangay cư trú.

pub const WARDS: [&str; 28] = [
    "6th Floor Ward",
    "7th Floor Ward",
    "ARI 2",
    "Dengue Ward",
    "Emergency Room Complex",
    "ICU",
    "Infectious Ward",
    "Medicine Female",
    "Medicine Isolation Room",
    "Medicine Male",
    "NICU",
    "NICU Transition",
    "NON-SARI",
    "OB Gyne Ward",
    "Pedia 3 Pulmo (Hema Ward)",
    "Pedia ICU",
    "Pedia ISO (4th)",
    "Pedia Isolation",
    "Pedia Ward 1 Stepdown",
    "Pedia Ward 3",
    "Pedia Ward 3 Extension",
    "Respiratory ICU",
    "SARI",
    "SARI 1",
    "SARI 2",
    "SARI 3",
    "Surgery Ward",
    "Others",
];

pub const BARANGAYS: [&str; 34] = [
    "Bangkal",
    "Bel-Air",
    "Carmona",
    "Cembo",
    "Comembo",
    "Dasmarinas",
    "East Rembo",
    "Forbes Park",
    "Guadalupe Nuevo",
    "Guadalupe Viejo",
    "Kasilawan",
    "La Paz",
    "Magallanes",
    "Olympia",
    "Palanan",
    "Pembo",
    "Pinagkaisahan",
    "Pio del Pilar",
    "Pitogo",
    "Poblacion",
    "Post Proper Northside",
    "Post Proper Southside",
    "Rizal",
    "San Antonio",
    "San Isidro",
    "San Lorenzo",
    "Santa Cruz",
    "Singkamas",
    "South Cembo",
    "Tejeros",
    "Urdaneta",
    "Valenzuela",
    "West Rembo",
    OUTSIDE_MAKATI,
];

/// Các barangay thuộc khu Embo.
pub const EMBO_BARANGAYS: [&str; 10] = [
    "Pembo",
    "Comembo",
    "Cembo",
    "East Rembo",
    "West Rembo",
    "South Cembo",
    "Pitogo",
    "Post Proper Northside",
    "Post Proper Southside",
    "Rizal",
];

pub const OUTSIDE_MAKATI: &str = "Outside Makati";

/// Thành phố suy ra từ barangay. Chuỗi rỗng nghĩa là người dùng tự nhập.
pub fn residence_city(barangay: &str) -> &'static str {
    if barangay == OUTSIDE_MAKATI {
        ""
    } else if EMBO_BARANGAYS.contains(&barangay) {
        "Embo"
    } else {
        "Makati"
    }
}

/// Khoa/phòng có trong danh mục; ngoài danh mục là khoa nhập tay.
pub fn is_listed_ward(name: &str) -> bool {
    WARDS.contains(&name)
}
