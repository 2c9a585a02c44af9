use crate::types::ExecutionError;
use rand::Rng;

// 与骰子服务共享的记法契约, 两边必须保持字节级一致:
// N?d(M|%)([+-]K)?  大小写不敏感, N>=1 缺省 1,
// M ∈ {4,6,8,10,12,20,100}, % 等价 100, K 为带符号整数
const VALID_SIDES: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl DiceSpec {
    /// 归一化记法, 如 "2d6+3"
    pub fn notation(&self) -> String {
        match self.modifier {
            0 => format!("{}d{}", self.count, self.sides),
            m if m > 0 => format!("{}d{}+{}", self.count, self.sides, m),
            m => format!("{}d{}{}", self.count, self.sides, m),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiceRoll {
    pub total: i64,
    pub rolls: Vec<u32>,
    pub modifier: i64,
    pub notation: String,
}

pub fn parse(notation: &str) -> Result<DiceSpec, ExecutionError> {
    let text = notation.trim().to_ascii_lowercase();
    let err = || ExecutionError::InvalidDiceNotation(notation.to_string());

    let (count_part, rest) = text.split_once('d').ok_or_else(err)?;

    // FromStr 会放过前导 '+', 这里只认裸数字
    let count = if count_part.is_empty() {
        1
    } else if count_part.bytes().all(|b| b.is_ascii_digit()) {
        count_part.parse::<u32>().map_err(|_| err())?
    } else {
        return Err(err());
    };
    if count < 1 {
        return Err(err());
    }

    // 面数: % 是 100 的别名, 其余必须是合法骰面
    let (sides, modifier_part) = if let Some(rest) = rest.strip_prefix('%') {
        (100, rest)
    } else {
        let digits_end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let sides = rest[..digits_end].parse::<u32>().map_err(|_| err())?;
        (sides, &rest[digits_end..])
    };
    if !VALID_SIDES.contains(&sides) {
        return Err(err());
    }

    // 符号后必须是裸数字, "2d6++3" / "2d6+-3" 一类不收
    let parse_magnitude = |digits: &str| -> Result<i64, ExecutionError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        digits.parse::<i64>().map_err(|_| err())
    };
    let modifier = if modifier_part.is_empty() {
        0
    } else if let Some(digits) = modifier_part.strip_prefix('+') {
        parse_magnitude(digits)?
    } else if let Some(digits) = modifier_part.strip_prefix('-') {
        -parse_magnitude(digits)?
    } else {
        return Err(err());
    };

    Ok(DiceSpec {
        count,
        sides,
        modifier,
    })
}

pub fn roll<R: Rng>(spec: &DiceSpec, rng: &mut R) -> DiceRoll {
    let rolls: Vec<u32> = (0..spec.count)
        .map(|_| rng.gen_range(1..=spec.sides))
        .collect();
    let total = rolls.iter().map(|&r| r as i64).sum::<i64>() + spec.modifier;

    DiceRoll {
        total,
        rolls,
        modifier: spec.modifier,
        notation: spec.notation(),
    }
}

pub fn roll_notation(notation: &str) -> Result<DiceRoll, ExecutionError> {
    let spec = parse(notation)?;
    Ok(roll(&spec, &mut rand::thread_rng()))
}
