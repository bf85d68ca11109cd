//! CT slice projections (sagittal, coronal, axial).
//!
//! CT viewers zoom and pan over the fitted slice, and calibrate from the
//! pixel spacing carried by the series when it is available.

use cephkit_core::MeasurementUnit::{Degrees, Millimeters};
use cephkit_core::ViewportPolicy;

use super::{Formula, MeasurementDef, Module, ProjectionConfig, Rgba};
use crate::calibration::{CalibrationMode, ReferenceObject};

pub const SAGITTAL: &str = "ct.sagittal";
pub const CORONAL: &str = "ct.coronal";
pub const AXIAL: &str = "ct.axial";

const YELLOW: Rgba = Rgba::rgb(181, 137, 0);
const CYAN: Rgba = Rgba::rgb(42, 161, 152);

pub fn projections() -> Vec<ProjectionConfig> {
    vec![sagittal(), coronal(), axial()]
}

fn base(key: &str, label: &str) -> ProjectionConfig {
    ProjectionConfig::new(key, Module::Ct, label)
        .with_calibration(CalibrationMode::ReferenceObject {
            object: ReferenceObject::Implant,
            size_mm: 10.0,
        })
        .with_viewport(ViewportPolicy::FitWithUserZoom)
}

fn sagittal() -> ProjectionConfig {
    let group = "Tooth sections";
    base(SAGITTAL, "Sagittal slice")
        .with_landmarks(&[
            ("tw_u1", "Upper incisor, labial surface"),
            ("tw_u2", "Upper incisor, palatal surface"),
            ("tw_l1", "Lower incisor, labial surface"),
            ("tw_l2", "Lower incisor, lingual surface"),
            ("bt_u1", "Upper alveolus, labial cortex"),
            ("bt_u2", "Upper alveolus, palatal cortex"),
            ("bt_l1", "Lower alveolus, labial cortex"),
            ("bt_l2", "Lower alveolus, lingual cortex"),
        ])
        .with_measurements(vec![
            MeasurementDef::new("tooth_width_upper", "Upper tooth width", Formula::distance("tw_u1", "tw_u2"), Millimeters)
                .in_group(group),
            MeasurementDef::new("tooth_width_lower", "Lower tooth width", Formula::distance("tw_l1", "tw_l2"), Millimeters)
                .in_group(group),
            MeasurementDef::new(
                "bone_thickness_upper",
                "Upper alveolar bone thickness",
                Formula::distance("bt_u1", "bt_u2"),
                Millimeters,
            )
            .in_group(group),
            MeasurementDef::new(
                "bone_thickness_lower",
                "Lower alveolar bone thickness",
                Formula::distance("bt_l1", "bt_l2"),
                Millimeters,
            )
            .in_group(group),
        ])
        .with_line("upper_bone", "Upper alveolus", "bt_u1", "bt_u2", YELLOW)
        .with_line("lower_bone", "Lower alveolus", "bt_l1", "bt_l2", YELLOW)
}

fn coronal() -> ProjectionConfig {
    let basal = "Apical base width";
    let pen = "Molar inclination";
    let upper = || Formula::distance("bw_u_R", "bw_u_L");
    let lower = || Formula::distance("bw_l_R", "bw_l_L");
    base(CORONAL, "Coronal slice")
        .with_landmarks(&[
            ("bw_u_R", "Upper apical base, right"),
            ("bw_u_L", "Upper apical base, left"),
            ("bw_l_R", "Lower apical base, right"),
            ("bw_l_L", "Lower apical base, left"),
            ("u6_cusp", "Upper first molar, buccal cusp"),
            ("u6_root", "Upper first molar, palatal root apex"),
            ("l6_cusp", "Lower first molar, buccal cusp"),
            ("l6_root", "Lower first molar, mesial root apex"),
        ])
        .with_measurements(vec![
            MeasurementDef::new("basal_width_upper", "Upper basal width", upper(), Millimeters).in_group(basal),
            MeasurementDef::new("basal_width_lower", "Lower basal width", lower(), Millimeters).in_group(basal),
            MeasurementDef::new(
                "basal_width_deficit",
                "Basal width deficit",
                Formula::difference(lower(), upper()),
                Millimeters,
            )
            .in_group(basal)
            .with_note("Lower minus upper basal width; positive values indicate a transverse maxillary deficit"),
            MeasurementDef::new(
                "molar_inclination_upper",
                "Upper molar inclination",
                Formula::line_angle(["bw_u_R", "bw_u_L"], ["u6_root", "u6_cusp"], false),
                Degrees,
            )
            .in_group(pen)
            .with_note("Angle between the molar long axis and the upper basal line"),
            MeasurementDef::new(
                "molar_inclination_lower",
                "Lower molar inclination",
                Formula::line_angle(["bw_l_R", "bw_l_L"], ["l6_root", "l6_cusp"], false),
                Degrees,
            )
            .in_group(pen)
            .with_note("Angle between the molar long axis and the lower basal line"),
        ])
        .with_line("upper_base", "Upper apical base", "bw_u_R", "bw_u_L", YELLOW)
        .with_line("lower_base", "Lower apical base", "bw_l_R", "bw_l_L", YELLOW)
        .with_line("u6_axis", "Upper molar axis", "u6_root", "u6_cusp", CYAN)
        .with_line("l6_axis", "Lower molar axis", "l6_root", "l6_cusp", CYAN)
}

fn axial() -> ProjectionConfig {
    base(AXIAL, "Axial slice")
        .with_landmarks(&[
            ("aw_ant", "Airway, anterior wall"),
            ("aw_post", "Airway, posterior wall"),
            ("aw_R", "Airway, right wall"),
            ("aw_L", "Airway, left wall"),
            ("tongue", "Tongue dorsum"),
            ("palate", "Soft palate"),
        ])
        .with_measurements(vec![
            MeasurementDef::new(
                "airway_ap",
                "Airway depth",
                Formula::distance("aw_ant", "aw_post"),
                Millimeters,
            )
            .in_group("Airway"),
            MeasurementDef::new("airway_lateral", "Airway width", Formula::distance("aw_R", "aw_L"), Millimeters)
                .in_group("Airway"),
            MeasurementDef::new(
                "tongue_position",
                "Tongue to soft palate",
                Formula::distance("tongue", "palate"),
                Millimeters,
            )
            .in_group("Airway"),
        ])
        .with_line("airway_ap", "Airway depth", "aw_ant", "aw_post", CYAN)
        .with_line("airway_lat", "Airway width", "aw_R", "aw_L", CYAN)
}
