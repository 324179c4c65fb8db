//! Simple functions for writing fire group trajectories and protected areas as KML.
//!
//! This only covers the small part of KML needed to look at the results of an analysis in a
//! viewer like Google Earth. It is a streaming API, so the caller is responsible for closing every
//! element it opens.

use crate::{
    classify::{BehaviorLabel, ClassifiedTrajectory},
    geo::{Coord, Polygon, ProtectedArea},
    FireGroupsResult,
};
use chrono::NaiveDate;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use strum::IntoEnumIterator;

/// A KML document written to a file. The document is closed when this is dropped.
pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> FireGroupsResult<Self> {
        let f = File::create(pth.as_ref())?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
    }
}

/// A KML document kept in memory.
#[derive(Debug, Default)]
pub struct KmlBuffer(Vec<u8>);

impl KmlBuffer {
    pub fn new() -> FireGroupsResult<Self> {
        let mut new = KmlBuffer(Vec::new());
        new.start_document()?;
        Ok(new)
    }

    /// Close the document and return its text.
    pub fn finish(mut self) -> FireGroupsResult<String> {
        self.finish_document();
        Ok(String::from_utf8(self.0)?)
    }
}

impl KmlWriter for KmlBuffer {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> FireGroupsResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
    }

    fn write_description(&mut self, description: &str) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description
        )?;
        Ok(())
    }

    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        is_open: bool,
    ) -> FireGroupsResult<()> {
        writeln!(self.output(), "<Folder>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if is_open {
            writeln!(self.output(), "<open>1</open>")?;
        }

        Ok(())
    }

    fn finish_folder(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> FireGroupsResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        Ok(())
    }

    fn finish_placemark(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    fn start_style(&mut self, style_id: Option<&str>) -> FireGroupsResult<()> {
        if let Some(style_id) = style_id {
            writeln!(self.output(), "<Style id=\"{}\">", style_id)?;
        } else {
            writeln!(self.output(), "<Style>")?;
        }
        Ok(())
    }

    fn finish_style(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Create a LineStyle element. Colors are KML `aabbggrr` hex strings.
    ///
    /// These should ONLY go inside a style element.
    fn create_line_style(&mut self, color: &str, width: f64) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<LineStyle>\n<color>{}</color>\n<width>{}</width>\n</LineStyle>",
            color,
            width
        )?;
        Ok(())
    }

    /// Create a PolyStyle element.
    ///
    /// These should ONLY go inside a style element.
    fn create_poly_style(
        &mut self,
        color: Option<&str>,
        filled: bool,
        outlined: bool,
    ) -> FireGroupsResult<()> {
        writeln!(self.output(), "<PolyStyle>")?;

        if let Some(color) = color {
            writeln!(self.output(), "<color>{}</color>", color)?;
            writeln!(self.output(), "<colorMode>normal</colorMode>")?;
        } else {
            writeln!(self.output(), "<colorMode>random</colorMode>")?;
        }

        writeln!(self.output(), "<fill>{}</fill>", filled as u8)?;
        writeln!(self.output(), "<outline>{}</outline>", outlined as u8)?;

        writeln!(self.output(), "</PolyStyle>")?;
        Ok(())
    }

    fn create_icon_style(&mut self, color: Option<&str>, scale: f64) -> FireGroupsResult<()> {
        writeln!(self.output(), "<IconStyle>")?;

        if let Some(color) = color {
            writeln!(self.output(), "<color>{}</color>", color)?;
        }

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        writeln!(self.output(), "</IconStyle>")?;
        Ok(())
    }

    /// Write out a TimeSpan covering whole days from the start of `start` to the end of `end`.
    fn timespan(&mut self, start: NaiveDate, end: NaiveDate) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<TimeSpan>\n<begin>{}</begin>\n<end>{}</end>\n</TimeSpan>",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )?;
        Ok(())
    }

    fn start_multi_geometry(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "<MultiGeometry>")?;
        Ok(())
    }

    fn finish_multi_geometry(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</MultiGeometry>")?;
        Ok(())
    }

    /// Start a Polygon element clamped to the ground.
    fn start_polygon(&mut self) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<Polygon>\n<altitudeMode>clampToGround</altitudeMode>\n<tessellate>1</tessellate>"
        )?;
        Ok(())
    }

    fn finish_polygon(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</Polygon>")?;
        Ok(())
    }

    /// Write a complete ring, closing it if the first vertex isn't repeated at the end.
    ///
    /// This should only be used inside a Polygon element.
    fn polygon_ring(&mut self, ring: &[Coord], outer: bool) -> FireGroupsResult<()> {
        let tag = if outer {
            "outerBoundaryIs"
        } else {
            "innerBoundaryIs"
        };

        writeln!(self.output(), "<{}>\n<LinearRing>\n<coordinates>", tag)?;
        for vertex in ring {
            self.add_vertex(*vertex)?;
        }
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                self.add_vertex(*first)?;
            }
        }
        writeln!(self.output(), "</coordinates>\n</LinearRing>\n</{}>", tag)?;
        Ok(())
    }

    /// Start a LineString that follows the ground.
    fn start_line_string(&mut self) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<LineString>\n<tessellate>1</tessellate>\n<coordinates>"
        )?;
        Ok(())
    }

    fn finish_line_string(&mut self) -> FireGroupsResult<()> {
        writeln!(self.output(), "</coordinates>\n</LineString>")?;
        Ok(())
    }

    /// Add a vertex to a LinearRing or LineString.
    fn add_vertex(&mut self, coord: Coord) -> FireGroupsResult<()> {
        writeln!(self.output(), "{},{},0", coord.lon, coord.lat)?;
        Ok(())
    }

    /// Write out a KML Point element
    fn create_point(&mut self, coord: Coord) -> FireGroupsResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},0</coordinates>\n</Point>",
            coord.lon,
            coord.lat
        )?;
        Ok(())
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                  Analysis Output
 *-----------------------------------------------------------------------------------------------*/
/// Color used for a behavior label, in KML `aabbggrr` format.
fn label_color(label: BehaviorLabel) -> &'static str {
    use BehaviorLabel::*;

    match label {
        Transhumance | TranshumanceSlow => "ff0000ff",
        HerderFast | HerderLocal => "ff00a5ff",
        ManagementFast | ManagementVehicle => "ffff0000",
        LocalBurning => "ff00ffff",
        VillagePersistent | LocalStationary => "ff00ff00",
        Unknown => "ff888888",
    }
}

/// Write a shared style for each behavior label, referenced as `#<label name>`.
pub fn write_label_styles<K: KmlWriter + ?Sized>(kml: &mut K) -> FireGroupsResult<()> {
    for label in BehaviorLabel::iter() {
        let name: &'static str = label.into();
        kml.start_style(Some(name))?;
        kml.create_line_style(label_color(label), 3.0)?;
        kml.create_icon_style(Some(label_color(label)), 0.8)?;
        kml.finish_style()?;
    }

    Ok(())
}

/**
 * Write a trajectory as a folder with its path and a placemark for each day.
 *
 * The styles from [write_label_styles] should already be in the document.
 */
pub fn write_trajectory<K: KmlWriter + ?Sized>(
    kml: &mut K,
    name: &str,
    ct: &ClassifiedTrajectory,
) -> FireGroupsResult<()> {
    let label: &'static str = ct.label.into();
    let style = format!("#{}", label);
    let traj = &ct.trajectory;

    let description = match ct.metrics.map(|m| m.rounded()) {
        Some(m) => format!(
            "{}<br/>{} days, {} fires<br/>{:.1} km south, {:.1} km east<br/>\
             average {:.1} km/day, max {:.1} km/day",
            label,
            m.days,
            m.fires,
            m.net_south_km,
            m.net_east_km,
            m.avg_speed_km_day,
            m.max_speed_km_day
        ),
        None => label.to_owned(),
    };

    kml.start_folder(Some(name), Some(&description), false)?;

    kml.start_placemark(Some("path"), None, Some(&style))?;
    kml.timespan(traj.start_date(), traj.end_date())?;
    kml.start_line_string()?;
    for coord in traj.path() {
        kml.add_vertex(coord)?;
    }
    kml.finish_line_string()?;
    kml.finish_placemark()?;

    for cluster in traj.clusters() {
        let day_name = cluster.date().format("%Y-%m-%d").to_string();
        let day_desc = format!(
            "{} fires<br/>{:.1} MW<br/>{:.1} km across",
            cluster.count(),
            cluster.total_power(),
            cluster.spatial_extent_km()
        );

        kml.start_placemark(Some(&day_name), Some(&day_desc), Some(&style))?;
        kml.timespan(cluster.date(), cluster.date())?;
        kml.create_point(Coord::new(cluster.lat(), cluster.lon()))?;
        kml.finish_placemark()?;
    }

    kml.finish_folder()?;

    Ok(())
}

fn write_polygon<K: KmlWriter + ?Sized>(kml: &mut K, poly: &Polygon) -> FireGroupsResult<()> {
    kml.start_polygon()?;
    kml.polygon_ring(poly.exterior(), true)?;
    for hole in poly.holes() {
        kml.polygon_ring(hole, false)?;
    }
    kml.finish_polygon()
}

/// Write the outline of a protected area as a single placemark.
pub fn write_protected_area<K: KmlWriter + ?Sized>(
    kml: &mut K,
    area: &ProtectedArea,
) -> FireGroupsResult<()> {
    kml.start_style(Some("protected_area"))?;
    kml.create_poly_style(Some("4000ff00"), true, true)?;
    kml.finish_style()?;

    kml.start_placemark(Some(area.id()), None, Some("#protected_area"))?;
    kml.start_multi_geometry()?;
    for poly in area.polygons() {
        write_polygon(kml, poly)?;
    }
    kml.finish_multi_geometry()?;
    kml.finish_placemark()?;

    Ok(())
}
