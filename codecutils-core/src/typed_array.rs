use crate::node::Node;
use crate::number::Number;

/// Element type of a typed numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    I8,
    U8,
    /// Unsigned bytes clamped to 0..=255 on write.
    U8Clamped,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// Broad numeric category of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Int,
    Float,
}

impl ElementType {
    /// Every element type, in declaration order.
    pub const ALL: [ElementType; 11] = [
        ElementType::I8,
        ElementType::U8,
        ElementType::U8Clamped,
        ElementType::I16,
        ElementType::U16,
        ElementType::I32,
        ElementType::U32,
        ElementType::I64,
        ElementType::U64,
        ElementType::F32,
        ElementType::F64,
    ];

    /// Size of one element in bytes.
    pub fn bytes_per_element(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 | ElementType::U8Clamped => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 => 8,
        }
    }

    pub fn category(self) -> Category {
        match self {
            ElementType::F32 | ElementType::F64 => Category::Float,
            _ => Category::Int,
        }
    }

    /// Whether elements can hold negative values.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ElementType::I8
                | ElementType::I16
                | ElementType::I32
                | ElementType::I64
                | ElementType::F32
                | ElementType::F64
        )
    }

    /// Conventional array name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ElementType::I8 => "Int8Array",
            ElementType::U8 => "Uint8Array",
            ElementType::U8Clamped => "Uint8ClampedArray",
            ElementType::I16 => "Int16Array",
            ElementType::U16 => "Uint16Array",
            ElementType::I32 => "Int32Array",
            ElementType::U32 => "Uint32Array",
            ElementType::I64 => "BigInt64Array",
            ElementType::U64 => "BigUint64Array",
            ElementType::F32 => "Float32Array",
            ElementType::F64 => "Float64Array",
        }
    }
}

/// Metadata describing a typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedArrayInfo {
    pub category: Category,
    pub signed: bool,
    pub bytes_per_element: usize,
    pub byte_length: usize,
    pub length: usize,
}

/// A fixed-width homogeneous numeric array.
///
/// Typed arrays are leaves of a node graph: they are visited and replaced as a
/// whole, never walked element by element.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    I8(Vec<i8>),
    U8(Vec<u8>),
    U8Clamped(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! for_each_variant {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            TypedArray::I8($values) => $body,
            TypedArray::U8($values) => $body,
            TypedArray::U8Clamped($values) => $body,
            TypedArray::I16($values) => $body,
            TypedArray::U16($values) => $body,
            TypedArray::I32($values) => $body,
            TypedArray::U32($values) => $body,
            TypedArray::I64($values) => $body,
            TypedArray::U64($values) => $body,
            TypedArray::F32($values) => $body,
            TypedArray::F64($values) => $body,
        }
    };
}

macro_rules! decode_ne {
    ($t:ty, $bytes:expr) => {
        $bytes
            .chunks_exact(std::mem::size_of::<$t>())
            .map(|chunk| {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(chunk);
                <$t>::from_ne_bytes(raw)
            })
            .collect()
    };
}

impl TypedArray {
    /// Builds an array from raw bytes in native byte order.
    ///
    /// Trailing bytes that do not fill a whole element are ignored.
    pub fn from_ne_bytes(element_type: ElementType, bytes: &[u8]) -> Self {
        match element_type {
            ElementType::I8 => TypedArray::I8(bytes.iter().map(|&b| b as i8).collect()),
            ElementType::U8 => TypedArray::U8(bytes.to_vec()),
            ElementType::U8Clamped => TypedArray::U8Clamped(bytes.to_vec()),
            ElementType::I16 => TypedArray::I16(decode_ne!(i16, bytes)),
            ElementType::U16 => TypedArray::U16(decode_ne!(u16, bytes)),
            ElementType::I32 => TypedArray::I32(decode_ne!(i32, bytes)),
            ElementType::U32 => TypedArray::U32(decode_ne!(u32, bytes)),
            ElementType::I64 => TypedArray::I64(decode_ne!(i64, bytes)),
            ElementType::U64 => TypedArray::U64(decode_ne!(u64, bytes)),
            ElementType::F32 => TypedArray::F32(decode_ne!(f32, bytes)),
            ElementType::F64 => TypedArray::F64(decode_ne!(f64, bytes)),
        }
    }

    /// Returns the raw bytes of the array in native byte order.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        for_each_variant!(self, values => values
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect())
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            TypedArray::I8(_) => ElementType::I8,
            TypedArray::U8(_) => ElementType::U8,
            TypedArray::U8Clamped(_) => ElementType::U8Clamped,
            TypedArray::I16(_) => ElementType::I16,
            TypedArray::U16(_) => ElementType::U16,
            TypedArray::I32(_) => ElementType::I32,
            TypedArray::U32(_) => ElementType::U32,
            TypedArray::I64(_) => ElementType::I64,
            TypedArray::U64(_) => ElementType::U64,
            TypedArray::F32(_) => ElementType::F32,
            TypedArray::F64(_) => ElementType::F64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        for_each_variant!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_length(&self) -> usize {
        self.len() * self.element_type().bytes_per_element()
    }

    /// Returns the element at `index` as a plain number.
    pub fn get(&self, index: usize) -> Option<Number> {
        for_each_variant!(self, values => values.get(index).map(|&v| Number::from(v)))
    }

    /// Iterates over the elements as plain numbers, in order.
    pub fn iter(&self) -> impl Iterator<Item = Number> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copies the elements, by index, into a plain sequence node.
    pub fn to_sequence(&self) -> Node {
        Node::sequence(self.iter().map(Node::Number))
    }

    pub fn info(&self) -> TypedArrayInfo {
        let element_type = self.element_type();
        TypedArrayInfo {
            category: element_type.category(),
            signed: element_type.is_signed(),
            bytes_per_element: element_type.bytes_per_element(),
            byte_length: self.byte_length(),
            length: self.len(),
        }
    }
}

macro_rules! impl_from_vec {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for TypedArray {
            fn from(values: Vec<$t>) -> Self {
                TypedArray::$variant(values)
            }
        }
    };
}

impl_from_vec!(i8, I8);
impl_from_vec!(u8, U8);
impl_from_vec!(i16, I16);
impl_from_vec!(u16, U16);
impl_from_vec!(i32, I32);
impl_from_vec!(u32, U32);
impl_from_vec!(i64, I64);
impl_from_vec!(u64, U64);
impl_from_vec!(f32, F32);
impl_from_vec!(f64, F64);
