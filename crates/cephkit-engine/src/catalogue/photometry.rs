//! Clinical photograph projections.

use cephkit_core::MeasurementUnit::{Degrees, Millimeters, Percent};

use super::{Classifier, Formula, MeasurementDef, Module, ProjectionConfig, Rgba};
use crate::calibration::{CalibrationMode, ReferenceObject};

pub const FRONTAL: &str = "photo.frontal";
pub const FRONTAL_SMILE: &str = "photo.frontal_smile";
pub const FRONTAL_RETRACTOR: &str = "photo.frontal_retractor";
pub const PROFILE_RIGHT: &str = "photo.profile_right";
pub const PROFILE_LEFT: &str = "photo.profile_left";
pub const PROFILE_45: &str = "photo.profile_45";

const FACE_LANDMARKS: &[(&str, &str)] = &[
    ("eu_L", "Euryon, most lateral point of the head, left"),
    ("eu_R", "Euryon, most lateral point of the head, right"),
    ("zy_L", "Zygion, most lateral point of the zygomatic arch, left"),
    ("zy_R", "Zygion, most lateral point of the zygomatic arch, right"),
    ("go_L", "Gonion, angle of the mandible, left"),
    ("go_R", "Gonion, angle of the mandible, right"),
    ("n", "Soft-tissue nasion"),
    ("sn", "Subnasale"),
    ("gn", "Soft-tissue gnathion"),
    ("pg", "Soft-tissue pogonion"),
    ("oph", "Ophryon, midline at the level of the brow ridges"),
];

const RED: Rgba = Rgba::rgb(220, 50, 47);
const BLUE: Rgba = Rgba::rgb(38, 139, 210);
const GREEN: Rgba = Rgba::rgb(133, 153, 0);
const VIOLET: Rgba = Rgba::rgb(108, 113, 196);

pub fn projections() -> Vec<ProjectionConfig> {
    vec![
        face(FRONTAL, "Frontal photograph", &[]),
        face(
            FRONTAL_SMILE,
            "Frontal photograph, smiling",
            &[("ch_L", "Cheilion, mouth corner, left"), ("ch_R", "Cheilion, mouth corner, right")],
        )
        .with_line("commissures", "Commissure line", "ch_L", "ch_R", VIOLET),
        face(
            FRONTAL_RETRACTOR,
            "Frontal photograph with retractor",
            &[
                ("u1_tip", "Upper central incisor tip"),
                ("l1_tip", "Lower central incisor tip"),
                ("u6_mesiobuccal", "Upper first molar mesiobuccal cusp"),
                ("l6_mesiobuccal", "Lower first molar mesiobuccal cusp"),
            ],
        )
        .with_line("incisors", "Incisor line", "u1_tip", "l1_tip", VIOLET)
        .with_line("molars", "Molar line", "u6_mesiobuccal", "l6_mesiobuccal", VIOLET),
        profile(PROFILE_RIGHT, "Right profile", "go_R"),
        profile(PROFILE_LEFT, "Left profile", "go_L"),
        profile_45(),
    ]
}

fn reduced_norm_increased(low: f64, high: f64) -> Classifier {
    Classifier::range(low, high, "Reduced", "Norm", "Increased")
}

fn face(key: &str, label: &str, extra: &[(&str, &str)]) -> ProjectionConfig {
    let zy = || Formula::distance("zy_L", "zy_R");
    let oph_gn = || Formula::distance("oph", "gn");
    ProjectionConfig::new(key, Module::Photometry, label)
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Custom,
            size_mm: 10.0,
        })
        .with_landmarks(FACE_LANDMARKS)
        .with_landmarks(extra)
        .with_measurements(vec![
            MeasurementDef::new("eu_eu", "Head width (eu-eu)", Formula::distance("eu_L", "eu_R"), Millimeters)
                .classified(reduced_norm_increased(130.0, 160.0)),
            MeasurementDef::new("zy_zy", "Face width (zy-zy)", zy(), Millimeters)
                .classified(reduced_norm_increased(120.0, 150.0)),
            MeasurementDef::new("go_go", "Mandibular width (go-go)", Formula::distance("go_L", "go_R"), Millimeters)
                .classified(reduced_norm_increased(90.0, 120.0)),
            MeasurementDef::new("oph_gn", "Face height (oph-gn)", oph_gn(), Millimeters)
                .classified(reduced_norm_increased(110.0, 140.0)),
            MeasurementDef::new("oph_sn", "Midface height (oph-sn)", Formula::distance("oph", "sn"), Millimeters)
                .classified(reduced_norm_increased(50.0, 70.0)),
            MeasurementDef::new("sn_gn", "Lower face height (sn-gn)", Formula::distance("sn", "gn"), Millimeters)
                .classified(reduced_norm_increased(60.0, 80.0)),
            MeasurementDef::new("head_form", "Head-form index", Formula::ratio(zy(), oph_gn(), 100.0), Percent)
                .classified(Classifier::range(
                    75.9,
                    85.4,
                    "Dolichocephalic",
                    "Mesocephalic",
                    "Brachycephalic",
                )),
            MeasurementDef::new("izard", "Izard facial index", Formula::ratio(oph_gn(), zy(), 100.0), Percent)
                .classified(Classifier::Range {
                    low: Some(96.0),
                    high: Some(104.0),
                    inclusive: true,
                    below: "Wide face".into(),
                    within: "Average face".into(),
                    above: "Narrow face".into(),
                }),
        ])
        .with_line("midline", "Facial midline (n-gn)", "n", "gn", RED)
        .with_line("bizygomatic", "Bizygomatic line", "zy_L", "zy_R", BLUE)
        .with_line("bigonial", "Bigonial line", "go_L", "go_R", GREEN)
        .with_line("upper_third", "Upper third (oph-sn)", "oph", "sn", VIOLET)
}

fn profile_measurements() -> Vec<MeasurementDef> {
    vec![
        MeasurementDef::new("profile_angle", "Profile angle (n-sn-pg)", Formula::angle("n", "sn", "pg"), Degrees)
            .classified(Classifier::range(
                165.0,
                175.0,
                "Convex (distal) profile",
                "Straight profile",
                "Concave (mesial) profile",
            )),
        MeasurementDef::new("nasolabial", "Nasolabial angle", Formula::angle("sn", "ls", "coll"), Degrees)
            .classified(Classifier::range(100.0, 110.0, "Protrusive", "Normal", "Retrusive")),
    ]
}

fn profile(key: &str, label: &str, gonion: &str) -> ProjectionConfig {
    ProjectionConfig::new(key, Module::Photometry, label)
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Custom,
            size_mm: 10.0,
        })
        .with_landmarks(&[
            ("n", "Soft-tissue nasion"),
            ("sn", "Subnasale"),
            ("pg", "Soft-tissue pogonion"),
            ("pro", "Pronasale, nose tip"),
            ("pog", "Most prominent point of the chin"),
            ("ls", "Labrale superius"),
            ("coll", "Columella tangent point"),
            (gonion, "Gonion"),
            ("me", "Soft-tissue menton"),
        ])
        .with_measurements(profile_measurements())
        .with_line("e_line", "Esthetic line (pro-pog)", "pro", "pog", RED)
        .with_line("facial", "Facial line (n-pg)", "n", "pg", BLUE)
        .with_line("mandible", "Mandibular border", gonion, "me", GREEN)
        .with_line("columella", "Columella tangent", "coll", "sn", VIOLET)
        .with_angle("profile", "Profile angle", ["n", "sn", "pg"], BLUE)
        .with_angle("nasolabial", "Nasolabial angle", ["sn", "ls", "coll"], RED)
}

fn profile_45() -> ProjectionConfig {
    ProjectionConfig::new(PROFILE_45, Module::Photometry, "45° profile")
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Custom,
            size_mm: 10.0,
        })
        .with_landmarks(&[
            ("n", "Soft-tissue nasion"),
            ("sn", "Subnasale"),
            ("pg", "Soft-tissue pogonion"),
            ("pro", "Pronasale, nose tip"),
            ("pog", "Most prominent point of the chin"),
            ("ls", "Labrale superius"),
            ("coll", "Columella tangent point"),
            ("ch_R", "Cheilion, right"),
            ("zy_R", "Zygion, right"),
            ("go_R", "Gonion, right"),
        ])
        .with_measurements(vec![profile_measurements().remove(0)])
        .with_line("zygomatic", "Zygoma to gonion", "zy_R", "go_R", GREEN)
        .with_line("lip", "Nose tip to upper lip", "pro", "ls", RED)
        .with_line("facial", "Facial line (n-pg)", "n", "pg", BLUE)
        .with_angle("profile", "Profile angle", ["n", "sn", "pg"], BLUE)
}
