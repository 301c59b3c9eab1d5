use std::collections::HashSet;

use crate::error::{Result, VertexBufferError};

/// Size of one attribute component. Every component is an `f32`.
pub const COMPONENT_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// The widest attribute a shader input can take (`vec4<f32>`).
pub const MAX_COMPONENTS: u32 = 4;

/// One shader input slot inside a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
  /// Only used in diagnostics.
  pub name: &'static str,
  /// Shader location this attribute is bound to.
  pub binding_index: u32,
  /// Number of `f32` components, e.g. 2 for a 2D position, 4 for an RGBA color.
  pub component_count: u32,
  /// Offset of the attribute from the start of the record, in bytes.
  pub byte_offset: u64,
}

impl VertexAttribute {
  pub const fn new(
    name: &'static str,
    binding_index: u32,
    component_count: u32,
    byte_offset: u64,
  ) -> Self {
    Self {
      name,
      binding_index,
      component_count,
      byte_offset,
    }
  }

  pub const fn size_in_bytes(&self) -> u64 {
    self.component_count as u64 * COMPONENT_SIZE
  }
}

///
/// Describes the byte shape of one vertex record and how it maps onto shader
/// inputs.
///
/// Layouts are built once per record shape, normally as a `const`, and never
/// change afterwards. The `record` tag identifies the shape; a buffer created
/// for one layout rejects uploads of records declaring another.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
  record: &'static str,
  attributes: &'static [VertexAttribute],
  size_in_bytes: u64,
}

impl VertexLayout {
  pub const fn new(
    record: &'static str,
    attributes: &'static [VertexAttribute],
  ) -> Self {
    let mut size_in_bytes = 0;
    let mut i = 0;
    while i < attributes.len() {
      size_in_bytes += attributes[i].size_in_bytes();
      i += 1;
    }

    Self {
      record,
      attributes,
      size_in_bytes,
    }
  }

  pub fn record(&self) -> &'static str {
    self.record
  }

  pub fn attributes(&self) -> &'static [VertexAttribute] {
    self.attributes
  }

  /// Size of one record: the sum of all attribute sizes.
  pub fn size_in_bytes(&self) -> u64 {
    self.size_in_bytes
  }

  pub fn attribute(&self, name: &str) -> Option<&'static VertexAttribute> {
    self.attributes.iter().find(|attribute| attribute.name == name)
  }

  ///
  /// Check that the attributes describe a tightly packed record: at least one
  /// attribute, 1 to 4 components each, unique binding indices, and every
  /// offset equal to the sum of the attribute sizes before it.
  ///
  pub fn validate(&self) -> Result<()> {
    if self.attributes.is_empty() {
      return Err(self.invalid("no attributes"));
    }

    let mut bindings = HashSet::new();
    let mut expected_offset = 0;

    for attribute in self.attributes {
      if attribute.component_count == 0
        || attribute.component_count > MAX_COMPONENTS
      {
        return Err(self.invalid(format!(
          "attribute `{}` has {} components, expected 1..={MAX_COMPONENTS}",
          attribute.name, attribute.component_count
        )));
      }

      if !bindings.insert(attribute.binding_index) {
        return Err(self.invalid(format!(
          "binding index {} is used more than once",
          attribute.binding_index
        )));
      }

      if attribute.byte_offset != expected_offset {
        return Err(self.invalid(format!(
          "attribute `{}` starts at byte {}, expected {expected_offset}",
          attribute.name, attribute.byte_offset
        )));
      }

      expected_offset += attribute.size_in_bytes();
    }

    Ok(())
  }

  fn invalid(&self, reason: impl Into<String>) -> VertexBufferError {
    VertexBufferError::InvalidLayout {
      record: self.record,
      reason: reason.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const POSITION_COLOR: [VertexAttribute; 2] = [
    VertexAttribute::new("Position", 0, 2, 0),
    VertexAttribute::new("Color", 1, 4, 8),
  ];

  #[test]
  fn test_size_is_sum_of_attributes() {
    let layout = VertexLayout::new("PositionColor", &POSITION_COLOR);
    assert_eq!(layout.size_in_bytes(), 24);
    assert_eq!(layout.record(), "PositionColor");
    assert_eq!(layout.attributes().len(), 2);
    assert!(layout.validate().is_ok());
  }

  #[test]
  fn test_attribute_lookup() {
    let layout = VertexLayout::new("PositionColor", &POSITION_COLOR);
    let color = layout.attribute("Color").unwrap();
    assert_eq!(color.binding_index, 1);
    assert_eq!(color.size_in_bytes(), 16);
    assert!(layout.attribute("Normal").is_none());
  }

  #[test]
  fn test_empty_layout_is_rejected() {
    let layout = VertexLayout::new("Nothing", &[]);
    assert_eq!(layout.size_in_bytes(), 0);
    assert!(matches!(
      layout.validate(),
      Err(VertexBufferError::InvalidLayout {
        record: "Nothing",
        ..
      })
    ));
  }

  #[test]
  fn test_gap_between_attributes_is_rejected() {
    const GAPPED: [VertexAttribute; 2] = [
      VertexAttribute::new("Position", 0, 2, 0),
      VertexAttribute::new("Color", 1, 4, 12),
    ];
    let err = VertexLayout::new("Gapped", &GAPPED).validate().unwrap_err();
    assert_eq!(
      err.to_string(),
      "invalid vertex layout `Gapped`: attribute `Color` starts at byte 12, expected 8"
    );
  }

  #[test]
  fn test_overlapping_attributes_are_rejected() {
    const OVERLAPPING: [VertexAttribute; 2] = [
      VertexAttribute::new("Position", 0, 3, 0),
      VertexAttribute::new("Color", 1, 4, 8),
    ];
    let layout = VertexLayout::new("Overlapping", &OVERLAPPING);
    assert!(layout.validate().is_err());
  }

  #[test]
  fn test_duplicate_binding_is_rejected() {
    const DUPLICATE: [VertexAttribute; 2] = [
      VertexAttribute::new("Position", 0, 2, 0),
      VertexAttribute::new("TexCoord", 0, 2, 8),
    ];
    let err = VertexLayout::new("Duplicate", &DUPLICATE)
      .validate()
      .unwrap_err();
    assert!(err.to_string().contains("binding index 0"));
  }

  #[test]
  fn test_component_count_bounds() {
    const WIDE: [VertexAttribute; 1] = [VertexAttribute::new("Matrix", 0, 5, 0)];
    const EMPTY: [VertexAttribute; 1] = [VertexAttribute::new("Void", 0, 0, 0)];
    assert!(VertexLayout::new("Wide", &WIDE).validate().is_err());
    assert!(VertexLayout::new("Empty", &EMPTY).validate().is_err());
  }
}
