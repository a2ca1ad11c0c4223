pub mod bfactor;
pub mod describe;
pub mod plumed;
pub mod residues;
