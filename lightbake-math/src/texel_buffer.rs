use std::ops::{Index, IndexMut};

use crate::TexelColor;

/// Square grid of texels, addressed as `(i, j)` where `i` comes from the
/// light-map U axis and `j` from the V axis; storage is `i * size + j`.
#[derive(Clone, Debug, PartialEq)]
pub struct TexelBuffer {
    size: u32,
    texels: Vec<TexelColor>,
}

impl TexelBuffer {
    pub fn new(size: u32) -> Self {
        Self::filled(size, TexelColor::ZERO)
    }

    pub fn filled(size: u32, color: TexelColor) -> Self {
        Self {
            size,
            texels: vec![color; (size as usize) * (size as usize)],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.texels.len()
    }

    pub fn contains(&self, i: i32, j: i32) -> bool {
        let size = self.size as i32;

        i >= 0 && i < size && j >= 0 && j < size
    }

    pub fn get(&self, i: i32, j: i32) -> Option<&TexelColor> {
        if self.contains(i, j) {
            Some(&self.texels[self.offset(i as u32, j as u32)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, i: i32, j: i32) -> Option<&mut TexelColor> {
        if self.contains(i, j) {
            let offset = self.offset(i as u32, j as u32);

            Some(&mut self.texels[offset])
        } else {
            None
        }
    }

    pub fn texels(&self) -> &[TexelColor] {
        &self.texels
    }

    pub fn texels_mut(&mut self) -> &mut [TexelColor] {
        &mut self.texels
    }

    pub fn iter(&self) -> impl Iterator<Item = &TexelColor> + '_ {
        self.texels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TexelColor> + '_ {
        self.texels.iter_mut()
    }

    fn offset(&self, i: u32, j: u32) -> usize {
        (i as usize) * (self.size as usize) + (j as usize)
    }
}

impl Index<(u32, u32)> for TexelBuffer {
    type Output = TexelColor;

    fn index(&self, (i, j): (u32, u32)) -> &Self::Output {
        &self.texels[self.offset(i, j)]
    }
}

impl IndexMut<(u32, u32)> for TexelBuffer {
    fn index_mut(&mut self, (i, j): (u32, u32)) -> &mut Self::Output {
        let offset = self.offset(i, j);

        &mut self.texels[offset]
    }
}
