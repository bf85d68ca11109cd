//! Cephalometric X-ray projections: lateral, frontal and intraoral.

use cephkit_core::MeasurementUnit::{Degrees, Millimeters, Percent};

use super::{Classifier, Formula, MeasurementDef, Module, ProjectionConfig, Rgba};
use crate::calibration::{CalibrationMode, FixedDistance, ReferenceObject};

pub const LATERAL: &str = "ceph.lateral";
pub const FRONTAL: &str = "ceph.frontal";
pub const INTRAORAL: &str = "ceph.intraoral";

const NORM: &str = "Norm";

const RED: Rgba = Rgba::rgb(220, 50, 47);
const BLUE: Rgba = Rgba::rgb(38, 139, 210);
const GREEN: Rgba = Rgba::rgb(133, 153, 0);
const ORANGE: Rgba = Rgba::rgb(203, 75, 22);
const MAGENTA: Rgba = Rgba::rgb(211, 54, 130);
const CYAN: Rgba = Rgba::rgb(42, 161, 152);

pub fn projections() -> Vec<ProjectionConfig> {
    vec![lateral(), frontal(), intraoral()]
}

fn lateral() -> ProjectionConfig {
    ProjectionConfig::new(LATERAL, Module::Cephalometry, "Lateral cephalogram")
        .with_calibration(CalibrationMode::FixedDistance {
            distance: FixedDistance::Ten,
        })
        .with_landmarks(&[
            ("S", "Sella, centre of the sella turcica"),
            ("N", "Nasion, most anterior point of the frontonasal suture"),
            ("A", "Deepest point of the maxillary alveolar concavity"),
            ("B", "Deepest point of the mandibular alveolar concavity"),
            ("PNS", "Posterior nasal spine"),
            ("ANS", "Anterior nasal spine"),
            ("Go", "Gonion, angle of the mandible"),
            ("Me", "Menton, lowest point of the symphysis"),
            ("Pg", "Pogonion, most anterior point of the chin"),
            ("Ar", "Articulare, ramus and cranial base contour crossing"),
            ("Ba", "Basion, anterior margin of the foramen magnum"),
            ("Gn", "Gnathion, anterior inferior point of the symphysis"),
            ("E1", "Midpoint of the incisal edges (between ii and Is)"),
            ("P6", "Occlusal contact of the first molars"),
            ("ii", "Incision inferius, lower incisor edge"),
            ("Is", "Incision superius, upper incisor edge"),
            ("Aii", "Apex of the lower central incisor"),
            ("Ais", "Apex of the upper central incisor"),
            ("E3", "Condylar axis point"),
        ])
        .with_derived("E1", "ii", "Is")
        .with_measurements(lateral_measurements())
        .with_line("nsl", "NSL (S-N)", "S", "N", RED)
        .with_line("nl", "NL (ANS-PNS)", "ANS", "PNS", BLUE)
        .with_line("ml", "ML (Go-Me)", "Go", "Me", GREEN)
        .with_line("ol", "Functional occlusal plane (ii-P6)", "ii", "P6", ORANGE)
        .with_line("u1", "U1 axis", "Ais", "Is", MAGENTA)
        .with_line("l1", "L1 axis", "Aii", "ii", MAGENTA)
        .with_angle("sna", "SNA", ["S", "N", "A"], CYAN)
        .with_angle("snb", "SNB", ["S", "N", "B"], CYAN)
        .with_angle("anb", "ANB", ["A", "N", "B"], ORANGE)
        .with_angle("nsba", "N-S-Ba", ["N", "S", "Ba"], BLUE)
        .with_angle("gonial", "Gonial angle", ["Ar", "Go", "Me"], GREEN)
}

fn lateral_measurements() -> Vec<MeasurementDef> {
    let nsl = || Formula::distance("N", "S");
    vec![
        MeasurementDef::new("SNA", "SNA", Formula::angle("S", "N", "A"), Degrees).classified(
            Classifier::range(80.0, 84.0, "Maxillary retrognathia", NORM, "Maxillary prognathia"),
        ),
        MeasurementDef::new("SNB", "SNB", Formula::angle("S", "N", "B"), Degrees).classified(
            Classifier::range(78.0, 82.0, "Mandibular retrognathia", NORM, "Mandibular prognathia"),
        ),
        MeasurementDef::new("ANB", "ANB", Formula::angle("A", "N", "B"), Degrees)
            .classified(Classifier::range(0.0, 4.0, "Mesial relationship", NORM, "Distal relationship")),
        MeasurementDef::new("SNPg", "SN-Pg", Formula::angle("S", "N", "Pg"), Degrees)
            .classified(Classifier::range(82.0, 82.0, "Posterior chin position", NORM, "Anterior chin position")),
        MeasurementDef::new(
            "Beta",
            "Beta",
            Formula::AngleToFoot {
                arm: "A".into(),
                vertex: "B".into(),
                foot_of: "A".into(),
                line: ["E3".into(), "B".into()],
            },
            Degrees,
        )
        .classified(Classifier::range(27.0, 35.0, "Skeletal class II", "Skeletal class I", "Skeletal class III"))
        .with_note("Angle at B between A and the foot of the perpendicular from A onto E3-B"),
        MeasurementDef::new("NSBa", "N-S-Ba", Formula::angle("N", "S", "Ba"), Degrees)
            .classified(Classifier::range(130.0, 133.0, "Prognathic profile", NORM, "Retrognathic profile")),
        MeasurementDef::new("NL_NSL", "NL/NSL", Formula::line_angle(["N", "S"], ["ANS", "PNS"], false), Degrees)
            .classified(Classifier::range(
                5.0,
                9.0,
                "Maxillary anteinclination",
                NORM,
                "Maxillary retroinclination",
            )),
        MeasurementDef::new("ML_NSL", "ML/NSL", Formula::line_angle(["N", "S"], ["Go", "Me"], true), Degrees)
            .classified(Classifier::range(
                30.0,
                34.0,
                "Mandibular retroinclination",
                NORM,
                "Mandibular anteinclination",
            ))
            .with_note("NSL runs posteriorly and ML anteriorly, so the inter-plane angle is 180 minus the vector angle"),
        MeasurementDef::new("NL_ML", "NL/ML", Formula::line_angle(["ANS", "PNS"], ["Go", "Me"], true), Degrees)
            .classified(Classifier::range(22.0, 26.0, "Hypodivergent", NORM, "Hyperdivergent"))
            .with_note("NL runs posteriorly and ML anteriorly, so the inter-plane angle is 180 minus the vector angle"),
        MeasurementDef::new("NSAr", "N-S-Ar", Formula::angle("N", "S", "Ar"), Degrees).with_norm("123 ± 5°"),
        MeasurementDef::new("SArGo", "S-Ar-Go", Formula::angle("S", "Ar", "Go"), Degrees).with_norm("143 ± 6°"),
        MeasurementDef::new("ArGoMe", "Ar-Go-Me", Formula::angle("Ar", "Go", "Me"), Degrees).with_norm("130 ± 7°"),
        MeasurementDef::new("U1_NL", "U1/NL", Formula::line_angle(["ANS", "PNS"], ["Ais", "Is"], false), Degrees)
            .classified(Classifier::range(105.0, 115.0, "Upper incisor protrusion", NORM, "Upper incisor retrusion")),
        MeasurementDef::new("L1_ML", "L1/ML", Formula::line_angle(["Go", "Me"], ["Aii", "ii"], false), Degrees)
            .classified(Classifier::range(90.0, 95.0, "Lower incisor retrusion", NORM, "Lower incisor protrusion")),
        MeasurementDef::new("U1_L1", "U1/L1", Formula::line_angle(["Ais", "Is"], ["Aii", "ii"], false), Degrees)
            .classified(Classifier::range(130.0, 130.0, "Biprotrusion", NORM, "Biretrusion")),
        MeasurementDef::new("GonialAngle", "Gonial angle", Formula::angle("Ar", "Go", "Me"), Degrees)
            .classified(Classifier::range(115.0, 135.0, "Small gonial angle", NORM, "Large gonial angle")),
        MeasurementDef::new(
            "BjorkSum",
            "Björk sum",
            Formula::Sum {
                terms: vec![
                    Formula::angle("N", "S", "Ar"),
                    Formula::angle("S", "Ar", "Go"),
                    Formula::angle("Ar", "Go", "Me"),
                ],
            },
            Degrees,
        )
        .classified(Classifier::Range {
            low: Some(396.0),
            high: None,
            inclusive: false,
            below: "Horizontal growth type".into(),
            within: "Normal or vertical growth type".into(),
            above: "Vertical growth type".into(),
        }),
        MeasurementDef::new(
            "SGo_NMe",
            "SGo:NMe",
            Formula::ratio(Formula::distance("S", "Go"), Formula::distance("N", "Me"), 100.0),
            Percent,
        )
        .classified(Classifier::range(62.0, 65.0, "Horizontal growth type", NORM, "Vertical growth type")),
        MeasurementDef::new("A_Snp", "A'-Snp", Formula::distance("A", "PNS"), Millimeters)
            .classified(Classifier::Expected {
                expected: Formula::scaled(nsl(), 0.7, 0.0),
                tolerance: 0.0,
                below: "Maxillary micrognathia".into(),
                within: NORM.into(),
                above: "Maxillary macrognathia".into(),
            })
            .with_note("Expected length is 0.7 x NSL"),
        MeasurementDef::new("GoGn", "Go-Gn", Formula::distance("Go", "Gn"), Millimeters)
            .classified(Classifier::Expected {
                expected: Formula::scaled(nsl(), 1.0, 6.0),
                tolerance: 0.0,
                below: "Mandibular micrognathia".into(),
                within: NORM.into(),
                above: "Mandibular macrognathia".into(),
            })
            .with_note("Expected length is N-S + 6 mm"),
        MeasurementDef::new("N_A", "Anterior upper face height (N-A)", Formula::distance("N", "A"), Millimeters)
            .classified(Classifier::range(47.5, 52.5, "Reduced", NORM, "Increased")),
        MeasurementDef::new("A_Gn", "Anterior lower face height (A-Gn)", Formula::distance("A", "Gn"), Millimeters)
            .classified(Classifier::range(60.5, 69.5, "Reduced", NORM, "Increased")),
        MeasurementDef::new(
            "Wits",
            "Wits appraisal",
            Formula::ProjectedDistance {
                from: "A".into(),
                to: "B".into(),
                line: ["ii".into(), "P6".into()],
                signed: false,
            },
            Millimeters,
        )
        .classified(Classifier::range(1.0, 1.0, "Skeletal class III", NORM, "Skeletal class II"))
        .with_note("Distance between the feet of A and B on the functional occlusal plane ii-P6"),
    ]
}

fn frontal() -> ProjectionConfig {
    let bilateral = "Bilateral";
    ProjectionConfig::new(FRONTAL, Module::Cephalometry, "Frontal cephalogram")
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Implant,
            size_mm: 10.0,
        })
        .with_landmarks(&[
            ("J_L", "Jugale, left"),
            ("J_R", "Jugale, right"),
            ("U6_L", "Upper first molar, left"),
            ("U6_R", "Upper first molar, right"),
            ("L6_L", "Lower first molar, left"),
            ("L6_R", "Lower first molar, right"),
            ("Ag_L", "Antegonion, left"),
            ("Ag_R", "Antegonion, right"),
            ("Co_L", "Condylion, left"),
            ("Co_R", "Condylion, right"),
            ("Go_L", "Gonion, left"),
            ("Go_R", "Gonion, right"),
            ("Ar_L", "Articulare, left"),
            ("Ar_R", "Articulare, right"),
            ("Me", "Menton"),
            ("Cg", "Crista galli"),
            ("ANS", "Anterior nasal spine"),
        ])
        .with_measurements(vec![
            MeasurementDef::new("J_J", "J-J", Formula::distance("J_L", "J_R"), Millimeters).in_group("Widths"),
            MeasurementDef::new("U6_U6", "U6-U6", Formula::distance("U6_L", "U6_R"), Millimeters).in_group("Widths"),
            MeasurementDef::new("L6_L6", "L6-L6", Formula::distance("L6_L", "L6_R"), Millimeters).in_group("Widths"),
            MeasurementDef::new("Ag_Ag", "Ag-Ag", Formula::distance("Ag_L", "Ag_R"), Millimeters).in_group("Widths"),
            MeasurementDef::new("Co_Go_L", "Co-Go left", Formula::distance("Co_L", "Go_L"), Millimeters)
                .in_group(bilateral),
            MeasurementDef::new("Co_Go_R", "Co-Go right", Formula::distance("Co_R", "Go_R"), Millimeters)
                .in_group(bilateral),
            MeasurementDef::new("Go_Me_L", "Go-Me left", Formula::distance("Go_L", "Me"), Millimeters)
                .in_group(bilateral),
            MeasurementDef::new("Go_Me_R", "Go-Me right", Formula::distance("Go_R", "Me"), Millimeters)
                .in_group(bilateral),
            MeasurementDef::new("ArGoMe_L", "Ar-Go-Me left", Formula::angle("Ar_L", "Go_L", "Me"), Degrees)
                .in_group(bilateral),
            MeasurementDef::new("ArGoMe_R", "Ar-Go-Me right", Formula::angle("Ar_R", "Go_R", "Me"), Degrees)
                .in_group(bilateral),
            MeasurementDef::new("Cg_Me", "Cg-Me", Formula::distance("Cg", "Me"), Millimeters).in_group("Heights"),
            MeasurementDef::new("Cg_ANS", "Cg-ANS", Formula::distance("Cg", "ANS"), Millimeters).in_group("Heights"),
            MeasurementDef::new("ANS_Me", "ANS-Me", Formula::distance("ANS", "Me"), Millimeters).in_group("Heights"),
        ])
        .with_line("midline", "Facial midline (Cg-Me)", "Cg", "Me", RED)
        .with_line("jj", "Maxillary width (J-J)", "J_L", "J_R", BLUE)
        .with_line("agag", "Mandibular width (Ag-Ag)", "Ag_L", "Ag_R", GREEN)
        .with_angle("argome_l", "Ar-Go-Me left", ["Ar_L", "Go_L", "Me"], CYAN)
        .with_angle("argome_r", "Ar-Go-Me right", ["Ar_R", "Go_R", "Me"], CYAN)
}

fn intraoral() -> ProjectionConfig {
    ProjectionConfig::new(INTRAORAL, Module::Cephalometry, "Intraoral frontal")
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Crown,
            size_mm: 8.0,
        })
        .with_landmarks(&[
            ("midline_upper", "Upper dental midline"),
            ("midline_lower", "Lower dental midline"),
            ("canine_R", "Right canine cusp tip"),
            ("canine_L", "Left canine cusp tip"),
            ("molar_R", "Right first molar mesiobuccal cusp"),
            ("molar_L", "Left first molar mesiobuccal cusp"),
        ])
        .with_measurements(vec![
            MeasurementDef::new(
                "midline_shift",
                "Midline deviation",
                Formula::distance("midline_upper", "midline_lower"),
                Millimeters,
            )
            .classified(Classifier::Range {
                low: None,
                high: Some(2.0),
                inclusive: false,
                below: NORM.into(),
                within: NORM.into(),
                above: "Midline shift".into(),
            }),
            MeasurementDef::new(
                "intercanine",
                "Inter-canine width",
                Formula::distance("canine_R", "canine_L"),
                Millimeters,
            ),
            MeasurementDef::new("intermolar", "Inter-molar width", Formula::distance("molar_R", "molar_L"), Millimeters),
        ])
        .with_line("midline", "Dental midline", "midline_upper", "midline_lower", RED)
        .with_line("canines", "Canine line", "canine_R", "canine_L", BLUE)
        .with_line("molars", "Molar line", "molar_R", "molar_L", GREEN)
}
